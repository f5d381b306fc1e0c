use std::{
    sync::{Arc, Mutex, RwLock},
    time::Instant,
};

use lut_manager_client::{
    network::{Cluster, NetworkConfig},
    notifications::Notifications,
    reader::SnapshotFetcher,
    wallet::Wallet,
    workflow::{ExtendOptions, ExtendWorkflow},
    writer::LookupTableWriter,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;

type Rpc = Arc<RpcClient>;

/// Everything bound to one chain environment.
///
/// Switching networks replaces the whole session, so snapshots loaded for
/// the previous environment are never reused.
#[derive(Clone)]
pub struct Session {
    pub network: NetworkConfig,
    pub writer: LookupTableWriter<Rpc>,
    pub extend: Arc<ExtendWorkflow<Rpc>>,
    pub viewer: SnapshotFetcher<Rpc>,
}

impl Session {
    fn connect(network: NetworkConfig, wallet: Arc<dyn Wallet>, options: ExtendOptions) -> Self {
        let rpc = Arc::new(RpcClient::new_with_commitment(
            network.endpoint(),
            CommitmentConfig::confirmed(),
        ));
        Self {
            writer: LookupTableWriter::new(rpc.clone(), wallet.clone()),
            extend: Arc::new(ExtendWorkflow::new(rpc.clone(), wallet, options)),
            viewer: SnapshotFetcher::new(rpc),
            network,
        }
    }

    fn close(&self) {
        self.viewer.clear();
        self.extend.fetcher().clear();
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub wallet: Arc<dyn Wallet>,
    options: ExtendOptions,
    session: Arc<RwLock<Session>>,
    notifications: Arc<Mutex<Notifications>>,
}

impl ApiContext {
    pub fn new(network: NetworkConfig, wallet: Arc<dyn Wallet>, options: ExtendOptions) -> Self {
        let session = Session::connect(network, wallet.clone(), options);
        Self {
            wallet,
            options,
            session: Arc::new(RwLock::new(session)),
            notifications: Arc::new(Mutex::new(Notifications::new())),
        }
    }

    /// The current session. Handlers work on this copy so a network switch
    /// never waits on an in-flight request.
    pub fn session(&self) -> Session {
        self.session.read().unwrap().clone()
    }

    pub fn switch_network(&self, cluster: Cluster) -> NetworkConfig {
        let mut session = self.session.write().unwrap();
        if session.network.cluster == cluster {
            return session.network.clone();
        }
        let network = session.network.with_cluster(cluster);
        tracing::info!(%cluster, endpoint = %network.endpoint(), "switching network");
        session.close();
        *session = Session::connect(network.clone(), self.wallet.clone(), self.options);
        network
    }

    /// Run `f` against the notification queue at the current time
    pub fn notify<T>(&self, f: impl FnOnce(&mut Notifications, Instant) -> T) -> T {
        let mut notifications = self.notifications.lock().unwrap();
        f(&mut notifications, Instant::now())
    }
}
