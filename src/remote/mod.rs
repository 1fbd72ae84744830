//! Remote route aggregation and component resolution.
//!
//! ARCHITECTURE
//! ============
//! Leaf-first: `types` and `error` define the model; `registry` holds static
//! loaders; `handle` and `resolver` turn `(remote, component)` keys into
//! cached handles; `gateway` renders handles inside isolation scopes.
//! `loader` and `aggregate` build the route table; `diagnostics` probes remote
//! entry points for operators and never feeds back into the other modules.
//! `http` adapts the remote contract to HTTP.

pub mod aggregate;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod http;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod types;

pub use aggregate::{AggregateReport, RemoteAppEntry, RouteAggregator, SHELL_OWNER};
pub use diagnostics::{ProbeResult, RemoteDiagnostics};
pub use error::{ComponentLoadError, LoadHint, RenderError, RouteSourceError};
pub use gateway::{IsolationScope, RenderGateway, RenderedOutput};
pub use handle::ComponentHandle;
pub use loader::{RouteLoader, RouteSource, StaticRoutes};
pub use registry::{ComponentRegistry, ModuleLoader};
pub use resolver::RemoteComponentResolver;
pub use types::{AggregatedRoute, ComponentKey, RemoteComponent, RemoteModule, RenderContext, RouteDeclaration};
