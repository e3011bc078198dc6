use std::{sync::Arc, time::Duration};

use alloy::{primitives::Address, providers::DynProvider};
use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use rustc_hash::FxHashSet;
use simple_logger::SimpleLogger;
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use fluid_sync::{
    fluid::{CommonAddresses, DexPool},
    FluidDexEventPool, FluidDexFactory, FluidDexLiquidityProxy, LogPoller, MultiWrapper,
    RpcTransport, Settings, SynchronizableStateSource,
};

const DEX_KEY: &str = "FluidDex";

/// Starts one reserve poller per pool, at most once per address.
struct PoolSpawner {
    provider: DynProvider,
    multi: Arc<MultiWrapper>,
    common_addresses: CommonAddresses,
    max_versions: u64,
    poll_interval: Duration,
    cancellation_token: CancellationToken,
    tracked: FxHashSet<Address>,
}

impl PoolSpawner {
    /// `start_block` of `None` cold-starts at the head, for pools deployed
    /// after the global start.
    fn spawn(&mut self, pool: Address, start_block: Option<u64>, tasks: &mut JoinSet<()>) {
        if !self.tracked.insert(pool) {
            return;
        }

        let source = Arc::new(FluidDexEventPool::new(
            DEX_KEY,
            pool,
            self.common_addresses,
            self.multi.clone(),
            self.max_versions,
        ));
        let poller = LogPoller::new(self.provider.clone(), source, self.poll_interval);
        let token = self.cancellation_token.child_token();

        tasks.spawn(async move { poller.run(start_block, token).await });
    }
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .context("Failed to initialize logger")?;

    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let rpc_url = Url::parse(&settings.rpc.url).context("Invalid RPC URL")?;
    let transport = RpcTransport::new(
        rpc_url,
        settings.rpc.multicall_address,
        settings.rpc.call_timeout(),
    );
    let provider = transport.provider().clone();
    let multi = Arc::new(MultiWrapper::new(
        Arc::new(transport),
        settings.rpc.batch_size,
    ));

    let cancellation_token = CancellationToken::new();
    let poll_interval = Duration::from_millis(settings.sync.poll_interval_milliseconds);
    let common_addresses = settings.fluid.common_addresses();

    // Pin every subscriber to the same starting height
    let start_block = match settings.sync.start_block {
        Some(block) => block,
        None => multi
            .transport()
            .block_number()
            .await
            .context("Failed to fetch chain head")?,
    };

    let mut tasks = JoinSet::new();
    let (discovered_tx, mut discovered_rx) = mpsc::channel::<Vec<DexPool>>(128);
    let mut spawner = None;

    if settings.sync.aggregate_pools {
        let source = Arc::new(FluidDexLiquidityProxy::new(
            DEX_KEY,
            common_addresses,
            multi.clone(),
            settings.sync.max_state_versions,
        ));
        let poller = LogPoller::new(provider, source, poll_interval);
        let token = cancellation_token.child_token();
        tasks.spawn(async move { poller.run(Some(start_block), token).await });

        info!(
            "Tracking all pools as one state from block {}. Press Ctrl+C to stop.",
            start_block
        );
    } else {
        let factory = Arc::new(FluidDexFactory::new(
            DEX_KEY,
            common_addresses,
            multi.clone(),
            settings.sync.max_state_versions,
            Some(discovered_tx),
        ));

        let initial_pools = factory
            .get_state_or_generate(start_block, false)
            .await
            .context("Failed to list deployed pools")?;

        let mut pools = PoolSpawner {
            provider: provider.clone(),
            multi: multi.clone(),
            common_addresses,
            max_versions: settings.sync.max_state_versions,
            poll_interval,
            cancellation_token: cancellation_token.clone(),
            tracked: FxHashSet::default(),
        };

        for pool in initial_pools
            .iter()
            .map(|p| p.address)
            .chain(settings.fluid.pools.iter().copied())
        {
            pools.spawn(pool, Some(start_block), &mut tasks);
        }

        let factory_poller = LogPoller::new(provider, factory, poll_interval);
        let factory_token = cancellation_token.child_token();
        tasks.spawn(async move { factory_poller.run(Some(start_block), factory_token).await });

        info!(
            "Tracking {} pool(s) from block {}. Press Ctrl+C to stop.",
            pools.tracked.len(),
            start_block
        );
        spawner = Some(pools);
    }

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    loop {
        #[cfg(unix)]
        let terminate = sigterm_stream.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
                break;
            },
            _ = terminate => {
                info!("Received SIGTERM, exiting gracefully...");
                break;
            },
            Some(pools) = discovered_rx.recv() => {
                let Some(spawner) = spawner.as_mut() else { continue };
                for pool in pools {
                    info!("Tracking newly deployed pool {}", pool.address);
                    spawner.spawn(pool.address, None, &mut tasks);
                }
            },
        }
    }

    info!("Stopping pollers...");
    cancellation_token.cancel();

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            error!("Poller task panicked: {}", e);
        }
    }

    info!("All pollers stopped");
    Ok(())
}
