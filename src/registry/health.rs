//! Health probes (spec.md §4.2). Plain servers are probed with a GET to
//! `<url>/health`; session dialects are probed with a lightweight
//! `tools/list`, re-bootstrapping and retrying once on failure — the source's
//! asymmetric behavior, adopted as-is per spec.md §9's open question.

use reqwest::Client;

use crate::config::ServerDeclaration;
use crate::registry::server::Dialect;
use crate::registry::SessionState;
use crate::transport::{self, plain};

pub enum HealthStatus {
	/// Healthy, optionally carrying a freshly (re)established session if one
	/// was needed to complete the probe.
	Healthy { session: Option<SessionState> },
	Unhealthy,
}

pub async fn probe(client: &Client, decl: &ServerDeclaration, current_session: Option<SessionState>) -> HealthStatus {
	match decl.dialect {
		Dialect::Plain => {
			if plain::probe_health(client, decl).await {
				HealthStatus::Healthy { session: None }
			} else {
				HealthStatus::Unhealthy
			}
		},
		Dialect::Streamable | Dialect::Sse => probe_session_dialect(client, decl, current_session).await,
	}
}

async fn probe_session_dialect(client: &Client, decl: &ServerDeclaration, current_session: Option<SessionState>) -> HealthStatus {
	let session = match current_session {
		Some(s) => s,
		None => match bootstrap(client, decl).await {
			Some(s) => s,
			None => return HealthStatus::Unhealthy,
		},
	};

	if transport::call(client, decl, Some(&session), "tools/list", None).await.is_ok() {
		return HealthStatus::Healthy { session: Some(session) };
	}

	// Retry once, after a fresh bootstrap.
	match bootstrap(client, decl).await {
		Some(new_session) => {
			if transport::call(client, decl, Some(&new_session), "tools/list", None).await.is_ok() {
				HealthStatus::Healthy { session: Some(new_session) }
			} else {
				HealthStatus::Unhealthy
			}
		},
		None => HealthStatus::Unhealthy,
	}
}

async fn bootstrap(client: &Client, decl: &ServerDeclaration) -> Option<SessionState> {
	transport::initialize(client, decl).await.ok().and_then(|outcome| outcome.session)
}
