use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use courier_core::AppConfig;
use courier_dispatcher::{
    CampaignLifecycle, DeferredSendJob, DispatchWorker, JobRegistry, RecipientResolver,
    SenderRotator, SequenceRunner, TimingPlanner,
};
use courier_domain::ports::{InternalRouter, TransportGateway};
use courier_infrastructure::{
    create_pool, HttpTransportGateway, InboxRouter, PostgresAudienceRepository,
    PostgresCampaignRepository, PostgresDeferredMessageRepository, PostgresSendRepository,
    PostgresSenderAccountRepository, PostgresSequenceRepository, PostgresThreadRepository,
};

use crate::shutdown::ShutdownManager;

/// 应用装配: 连接池、仓储、协作方、三个轮询作业
pub struct Application {
    registry: JobRegistry,
    shutdown: ShutdownManager,
}

impl Application {
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let pool = create_pool(&config.database)
            .await
            .context("建立数据库连接池失败")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("执行数据库迁移失败")?;

        let campaign_repo = Arc::new(PostgresCampaignRepository::new(pool.clone()));
        let send_repo = Arc::new(PostgresSendRepository::new(pool.clone()));
        let sender_repo = Arc::new(PostgresSenderAccountRepository::new(pool.clone()));
        let sequence_repo = Arc::new(PostgresSequenceRepository::new(pool.clone()));
        let audience_repo = Arc::new(PostgresAudienceRepository::new(pool.clone()));
        let deferred_repo = Arc::new(PostgresDeferredMessageRepository::new(pool.clone()));
        let thread_repo = Arc::new(PostgresThreadRepository::new(pool.clone()));

        let transport: Arc<dyn TransportGateway> =
            Arc::new(HttpTransportGateway::new(&config.transport)?);
        let internal_router: Arc<dyn InternalRouter> =
            Arc::new(InboxRouter::new(thread_repo.clone()));

        let resolver = RecipientResolver::new(
            audience_repo.clone(),
            send_repo.clone(),
            campaign_repo.clone(),
        );
        let planner = TimingPlanner::new(send_repo.clone());
        let rotator = SenderRotator::new(sender_repo.clone());
        let lifecycle = CampaignLifecycle::new(campaign_repo.clone(), send_repo.clone());

        let dispatch_worker = Arc::new(DispatchWorker::new(
            campaign_repo,
            send_repo,
            resolver,
            planner,
            rotator,
            lifecycle,
            transport.clone(),
        ));
        let sequence_runner = Arc::new(SequenceRunner::new(
            sequence_repo,
            audience_repo,
            thread_repo,
            sender_repo.clone(),
            transport.clone(),
        ));
        let deferred_job = Arc::new(DeferredSendJob::new(
            deferred_repo,
            sender_repo,
            transport,
            internal_router,
        ));

        // 进程启动时显式注册全部作业，各自独立的轮询间隔
        let mut registry = JobRegistry::new();
        registry.register(
            deferred_job,
            Duration::from_secs(config.jobs.deferred_interval_seconds),
        );
        registry.register(
            sequence_runner,
            Duration::from_secs(config.jobs.sequence_interval_seconds),
        );
        registry.register(
            dispatch_worker,
            Duration::from_secs(config.jobs.campaign_interval_seconds),
        );

        Ok(Self {
            registry,
            shutdown: ShutdownManager::new(),
        })
    }

    /// 运行所有作业直到收到退出信号
    pub async fn run(self) -> Result<()> {
        info!("启动 {} 个轮询作业", self.registry.len());
        let handles = self.registry.spawn_all(self.shutdown.sender());

        wait_for_signal().await;
        self.shutdown.shutdown().await;

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("作业任务退出异常: {}", e);
            }
        }

        info!("所有作业已退出");
        Ok(())
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("监听Ctrl+C失败: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => warn!("监听SIGTERM失败: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到Ctrl+C信号"),
        _ = terminate => info!("收到SIGTERM信号"),
    }
}
