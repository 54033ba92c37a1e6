use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use courier_core::CourierResult;

/// 一个可独立轮询的命名作业
///
/// tick失败只记录日志，由下个周期自然重试，没有额外退避。
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self) -> CourierResult<()>;
}

struct RegisteredJob {
    job: Arc<dyn Job>,
    period: Duration,
}

/// 作业注册表
///
/// 进程启动时构建一次，显式列出所有作业及各自的轮询间隔，
/// 替代隐式的全局调度器注册。
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<RegisteredJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn register(&mut self, job: Arc<dyn Job>, period: Duration) {
        info!("注册作业 {} (间隔 {:?})", job.name(), period);
        self.jobs.push(RegisteredJob { job, period });
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 为每个作业生成一个独立的轮询循环
    pub fn spawn_all(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        self.jobs
            .iter()
            .map(|registered| {
                let job = registered.job.clone();
                let period = registered.period;
                let receiver = shutdown.subscribe();
                tokio::spawn(run_job_loop(job, period, receiver))
            })
            .collect()
    }
}

/// 单个作业的轮询循环，收到关闭信号后退出
///
/// tick体await完成后才会进入下一轮，同一作业的tick不会重叠。
pub async fn run_job_loop(
    job: Arc<dyn Job>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = job.run().await {
                    error!("作业 {} 本次tick失败，下个周期重试: {}", job.name(), e);
                }
            }
            _ = shutdown.recv() => {
                info!("作业 {} 收到关闭信号，退出轮询", job.name());
                break;
            }
        }
    }
}
