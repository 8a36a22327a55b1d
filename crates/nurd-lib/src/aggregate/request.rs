//! Requested resource aggregation across a job's task groups

use crate::error::SchedulerError;
use crate::scheduler::{fetch_json, Endpoint, Job, SchedulerApi};
use tracing::debug;

/// Requested resources for one job, scaled by replica counts
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestTotals {
    pub cpu: f64,
    pub memory_mb: f64,
    pub disk_mb: f64,
    pub iops: f64,
}

impl RequestTotals {
    /// Sum every task's resources multiplied by its group's count
    pub fn from_job(job: &Job) -> Self {
        let mut totals = Self::default();

        for group in job.task_groups() {
            let count = f64::from(group.count);
            for resources in group.tasks.iter().filter_map(|t| t.resources.as_ref()) {
                totals.cpu += count * resources.cpu;
                totals.memory_mb += count * resources.memory_mb;
                totals.disk_mb += count * resources.disk_mb;
                totals.iops += count * resources.iops;
            }
        }

        totals
    }
}

/// Fetch a job's specification and sum its requested resources
pub async fn aggregate_requests(
    api: &dyn SchedulerApi,
    address: &str,
    job_id: &str,
) -> Result<RequestTotals, SchedulerError> {
    let job: Job = fetch_json(api, address, Endpoint::Job(job_id)).await?;
    let totals = RequestTotals::from_job(&job);

    debug!(
        cluster = %address,
        job_id = %job_id,
        task_groups = job.task_groups().len(),
        cpu = totals.cpu,
        memory_mb = totals.memory_mb,
        disk_mb = totals.disk_mb,
        iops = totals.iops,
        "Aggregated job requests"
    );

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{Resources, Task, TaskGroup};

    fn task(cpu: f64, memory_mb: f64, disk_mb: f64, iops: f64) -> Task {
        Task {
            resources: Some(Resources {
                cpu,
                memory_mb,
                disk_mb,
                iops,
            }),
        }
    }

    fn job(groups: Vec<TaskGroup>) -> Job {
        Job {
            task_groups: Some(groups),
        }
    }

    #[test]
    fn test_group_contribution_is_linear_in_count() {
        for count in [1u32, 2, 5, 17] {
            let totals = RequestTotals::from_job(&job(vec![TaskGroup {
                count,
                tasks: vec![task(250.0, 128.0, 300.0, 10.0)],
            }]));

            let n = f64::from(count);
            assert_eq!(
                totals,
                RequestTotals {
                    cpu: n * 250.0,
                    memory_mb: n * 128.0,
                    disk_mb: n * 300.0,
                    iops: n * 10.0,
                }
            );
        }
    }

    #[test]
    fn test_sums_across_groups_and_tasks() {
        let totals = RequestTotals::from_job(&job(vec![
            TaskGroup {
                count: 2,
                tasks: vec![task(100.0, 64.0, 0.0, 0.0), task(50.0, 32.0, 10.0, 1.0)],
            },
            TaskGroup {
                count: 3,
                tasks: vec![task(500.0, 256.0, 300.0, 0.0)],
            },
        ]));

        assert_eq!(totals.cpu, 2.0 * 150.0 + 3.0 * 500.0);
        assert_eq!(totals.memory_mb, 2.0 * 96.0 + 3.0 * 256.0);
        assert_eq!(totals.disk_mb, 2.0 * 10.0 + 3.0 * 300.0);
        assert_eq!(totals.iops, 2.0);
    }

    #[test]
    fn test_zero_count_contributes_zero() {
        let totals = RequestTotals::from_job(&job(vec![TaskGroup {
            count: 0,
            tasks: vec![task(1000.0, 1024.0, 500.0, 50.0)],
        }]));

        assert_eq!(totals, RequestTotals::default());
    }

    #[test]
    fn test_empty_job_is_zero() {
        assert_eq!(RequestTotals::from_job(&Job::default()), RequestTotals::default());
        assert_eq!(RequestTotals::from_job(&job(vec![])), RequestTotals::default());
        assert_eq!(
            RequestTotals::from_job(&job(vec![TaskGroup {
                count: 4,
                tasks: vec![Task { resources: None }],
            }])),
            RequestTotals::default()
        );
    }
}
