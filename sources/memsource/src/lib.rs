//! In-memory collaborators for a [`clustermon::Monitor`]: a scriptable
//! membership source and a driver provider.

use std::sync::Arc;
use std::sync::Mutex;

use clustermon::errors::QueryError;
use clustermon::query::driver::Components;
use clustermon::Driver;
use clustermon::DriverProvider;
use clustermon::MemberDescriptor;
use clustermon::MembershipQuery;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug)]
struct SourceState {
    /// What the next fetch returns.
    result: Result<Vec<MemberDescriptor>, QueryError>,

    /// Number of fetches started.
    fetches: u64,
}

/// An in-memory membership source implementing [`MembershipQuery`].
///
/// Every fetch returns the members last set with
/// [`set_members()`](Self::set_members), or the error last set with
/// [`fail_with()`](Self::fail_with). Fetches can be held in flight with
/// [`hold()`](Self::hold).
#[derive(Debug, Clone)]
pub struct MemSource {
    state: Arc<Mutex<SourceState>>,

    /// `true` while fetches are held.
    held: Arc<watch::Sender<bool>>,
}

impl Default for MemSource {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl MemSource {
    pub fn new(members: impl IntoIterator<Item = MemberDescriptor>) -> Self {
        let (held, _rx) = watch::channel(false);

        Self {
            state: Arc::new(Mutex::new(SourceState {
                result: Ok(members.into_iter().collect()),
                fetches: 0,
            })),
            held: Arc::new(held),
        }
    }

    /// A source of a non-clustered database.
    pub fn unsupported() -> Self {
        let s = Self::default();
        s.fail_with(QueryError::unsupported(
            "There is no procedure with the name `dbms.cluster.overview`",
        ));
        s
    }

    pub fn set_members(&self, members: impl IntoIterator<Item = MemberDescriptor>) {
        let mut state = self.state.lock().unwrap();
        state.result = Ok(members.into_iter().collect());
    }

    pub fn fail_with(&self, err: QueryError) {
        let mut state = self.state.lock().unwrap();
        state.result = Err(err);
    }

    /// Number of fetches started so far, including held ones.
    pub fn fetches(&self) -> u64 {
        let state = self.state.lock().unwrap();
        state.fetches
    }

    /// Block every fetch until [`release()`](Self::release) is called.
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }
}

impl MembershipQuery for MemSource {
    async fn fetch_members(
        &mut self,
    ) -> Result<Vec<MemberDescriptor>, QueryError> {
        let n = {
            let mut state = self.state.lock().unwrap();
            state.fetches += 1;
            state.fetches
        };

        let mut rx = self.held.subscribe();
        let _ = rx.wait_for(|held| !*held).await;

        let state = self.state.lock().unwrap();
        debug!("MemSource::fetch_members: {}th fetch: {:?}", n, state.result);

        state.result.clone()
    }
}

#[derive(Debug)]
struct DriversState {
    /// Addresses drivers were created for, in creating order.
    attached: Vec<String>,

    components: Result<Components, QueryError>,
}

/// A [`DriverProvider`] handing out [`MemDriver`]s.
#[derive(Debug, Clone)]
pub struct MemDrivers {
    state: Arc<Mutex<DriversState>>,
}

impl Default for MemDrivers {
    fn default() -> Self {
        let components = Components {
            name: "Neo4j Kernel".to_string(),
            versions: vec!["4.4.0".to_string()],
            edition: "enterprise".to_string(),
        };

        Self {
            state: Arc::new(Mutex::new(DriversState {
                attached: vec![],
                components: Ok(components),
            })),
        }
    }
}

impl MemDrivers {
    /// Set what every driver reports as the member's components.
    pub fn set_components(&self, components: Result<Components, QueryError>) {
        let mut state = self.state.lock().unwrap();
        state.components = components;
    }

    /// Addresses a driver was created for, in creating order.
    pub fn attached(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.attached.clone()
    }
}

impl DriverProvider for MemDrivers {
    type Driver = MemDriver;

    fn driver_for(&mut self, address: &str) -> Self::Driver {
        let mut state = self.state.lock().unwrap();
        state.attached.push(address.to_string());

        MemDriver {
            address: address.to_string(),
            drivers: self.clone(),
        }
    }
}

/// A driver of a single member, created by [`MemDrivers`].
#[derive(Debug, Clone)]
pub struct MemDriver {
    address: String,
    drivers: MemDrivers,
}

impl MemDriver {
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Driver for MemDriver {
    async fn components(&mut self) -> Result<Components, QueryError> {
        let state = self.drivers.state.lock().unwrap();
        state.components.clone()
    }
}
