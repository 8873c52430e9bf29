//! UseCase: 参加者の一括作成 (バッチ単位で並行に接続し、プールに登録する)
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員が接続に成功
//! - 異常系：一部・全員の失敗（他の参加者には影響しない）
//! - エッジケース：バッチサイズで割り切れない人数

use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;

use crate::{
    domain::JoinRequest,
    report::{Reporter, user_label},
};

use super::{pipeline::SessionPipeline, pool::ConnectionPool};

/// Batching of participant creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum number of pipelines running at once
    pub batch_size: usize,
    /// Pause between two batches (none after the last one)
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            inter_batch_delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of one `create_batch` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub requested: usize,
    pub active: usize,
}

impl BatchSummary {
    pub fn line(&self) -> String {
        format!("Active connections: {}/{}", self.active, self.requested)
    }
}

/// Sizes of the batches `total` requests are split into
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<usize> {
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size)
        .map(|start| batch_size.min(total - start))
        .collect()
}

/// 参加者一括作成のユースケース
pub struct SimulationUseCase {
    pipeline: Arc<dyn SessionPipeline>,
    pool: Arc<ConnectionPool>,
    reporter: Arc<dyn Reporter>,
    config: BatchConfig,
}

impl SimulationUseCase {
    pub fn new(
        pipeline: Arc<dyn SessionPipeline>,
        pool: Arc<ConnectionPool>,
        reporter: Arc<dyn Reporter>,
        config: BatchConfig,
    ) -> Self {
        Self {
            pipeline,
            pool,
            reporter,
            config,
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// 参加者をバッチ単位で作成する
    ///
    /// バッチ内のパイプラインは 1 つのタスク上で並行に実行され、全て完了するまで待つ。
    /// 失敗は報告されるだけで、同じバッチの他の参加者を取り消さない。
    ///
    /// # Returns
    ///
    /// 要求数と、完了時点でプールに登録されている接続数
    pub async fn create_batch(&self, requests: Vec<JoinRequest>) -> BatchSummary {
        let requested = requests.len();
        let batches = plan_batches(requested, self.config.batch_size);
        let batch_count = batches.len();
        tracing::info!(requested, batch_count, "Creating participants");

        let mut remaining = requests.into_iter();
        for (batch_index, size) in batches.into_iter().enumerate() {
            let batch: Vec<JoinRequest> = remaining.by_ref().take(size).collect();
            tracing::debug!(batch_index, size, "Starting batch");

            join_all(batch.iter().map(|request| self.create_one(request))).await;

            if batch_index + 1 < batch_count {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }

        let summary = BatchSummary {
            requested,
            active: self.pool.len().await,
        };
        self.reporter.announce(&summary.line());
        summary
    }

    async fn create_one(&self, request: &JoinRequest) {
        let user_index = request.user_index();
        match self.pipeline.establish(request).await {
            Ok(handle) => {
                self.pool.append(handle).await;
            }
            Err(e) => {
                tracing::error!(user_index, "Failed to create user: {}", e);
                self.reporter
                    .progress(&format!("{} failed: {}", user_label(user_index), e));
            }
        }
    }
}
