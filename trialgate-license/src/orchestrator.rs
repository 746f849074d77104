//! The startup licensing decision.
//!
//! ```text
//! resolve identity ──► cached token valid? ──yes──► Licensed
//!                              │no
//!                              ▼
//!                       query status ──► 11/21 ──► trial clock ──► TrialActive | Expired
//!                                    ──► 12/22 ──► trial clock (order pending)
//!                                    ──► 13/23 ──► verify + persist ──► Licensed
//!                                    ──► other ──► UnknownStatus
//! ```

use crate::config::LicenseConfig;
use crate::device::HostIdentityProvider;
use crate::error::{LicenseError, LicenseResult};
use crate::identity::{resolve_identity, ClientIdentity, IdentityProvider};
use crate::remote::{RemoteStatus, StatusClient, StatusService};
use crate::signature::TrustAnchor;
use crate::store::{FileStore, KeyValueStore, LICENSE_VALUE_NAME};
use crate::trial::{days_left, parse_first_launch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of a licensing evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseDecision {
    /// A verified license token exists for this client.
    Licensed,
    /// Unlicensed, still inside the trial window.
    TrialActive {
        /// Whole days left, always positive.
        days_left: i64,
        /// An order was placed and is waiting for payment.
        order_pending: bool,
    },
    /// Unlicensed and the trial window is closed.
    Expired,
}

impl LicenseDecision {
    /// Returns true unless the trial has expired.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Expired)
    }

    /// Turns [`LicenseDecision::Expired`] into [`LicenseError::TrialExpired`].
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::TrialExpired`] for an expired trial.
    pub fn ensure_usable(self) -> LicenseResult<Self> {
        match self {
            Self::Expired => Err(LicenseError::TrialExpired),
            other => Ok(other),
        }
    }
}

/// Composes identity, verification, the status service and the trial clock.
pub struct LicenseOrchestrator<I, S, R> {
    identity: I,
    store: S,
    remote: R,
    anchor: TrustAnchor,
    app_id: String,
    trial_days: i64,
}

impl LicenseOrchestrator<HostIdentityProvider, FileStore, StatusClient> {
    /// Wires the host identity provider, the file store for
    /// `config.namespace` and the HTTP status client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the public key
    /// cannot be parsed, or the store location cannot be determined.
    pub fn from_config(config: &LicenseConfig) -> LicenseResult<Self> {
        config.validate()?;
        let store = FileStore::for_namespace(&config.namespace)?;
        let remote = StatusClient::new(config.endpoint.clone(), config.timeout())?;
        Self::new(config, HostIdentityProvider::new(), store, remote)
    }
}

impl<I, S, R> LicenseOrchestrator<I, S, R>
where
    I: IdentityProvider,
    S: KeyValueStore,
    R: StatusService,
{
    /// Creates an orchestrator with injected collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] for an invalid configuration and
    /// [`LicenseError::KeyFormat`] if the public key cannot be parsed.
    pub fn new(config: &LicenseConfig, identity: I, store: S, remote: R) -> LicenseResult<Self> {
        config.validate()?;
        let anchor = TrustAnchor::from_base64_pem(&config.public_key)?;
        Ok(Self {
            identity,
            store,
            remote,
            anchor,
            app_id: config.app_id.clone(),
            trial_days: config.trial_days,
        })
    }

    /// Evaluates the license state now.
    ///
    /// # Errors
    ///
    /// Any [`LicenseError`] raised along the way; none are retried.
    pub async fn evaluate(&self) -> LicenseResult<LicenseDecision> {
        self.evaluate_at(Utc::now()).await
    }

    /// Evaluates the license state as of `now`.
    ///
    /// # Errors
    ///
    /// Any [`LicenseError`] raised along the way; none are retried.
    pub async fn evaluate_at(&self, now: DateTime<Utc>) -> LicenseResult<LicenseDecision> {
        let identity = resolve_identity(&self.identity)?;
        info!(kind = %identity.kind(), "Resolved client identity");
        debug!(identity = identity.as_str(), "Client identity");

        if self.cached_license_valid(&identity)? {
            info!("Cached license is valid");
            return Ok(LicenseDecision::Licensed);
        }

        let response = self.remote.query_status(&self.app_id, &identity).await?;
        let (status, family) = RemoteStatus::classify(response.status, response.detail())?;
        if family != identity.kind() {
            warn!(
                status = response.status,
                sent = %identity.kind(),
                "License service answered for a different identity kind"
            );
        }

        let decision = match status {
            RemoteStatus::Licensed { token } => self.accept_issued_token(&identity, &token)?,
            RemoteStatus::Trial { first_launch } => self.trial_decision(&first_launch, false, now)?,
            RemoteStatus::OrderPending { first_launch } => {
                self.trial_decision(&first_launch, true, now)?
            }
        };
        info!(?decision, "License evaluated");
        Ok(decision)
    }

    /// Checks the stored token. Missing, empty or non-matching tokens mean
    /// "ask the service"; a token that is not base64 is an error.
    fn cached_license_valid(&self, identity: &ClientIdentity) -> LicenseResult<bool> {
        let Some(token) = self.store.get(LICENSE_VALUE_NAME)? else {
            debug!("No cached license");
            return Ok(false);
        };
        if token.is_empty() {
            return Ok(false);
        }

        match self.anchor.verify(identity.as_str(), &token) {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!("Cached license does not match this client");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Cached license is malformed");
                Err(e)
            }
        }
    }

    /// Verifies a token issued by the service and persists it.
    fn accept_issued_token(
        &self,
        identity: &ClientIdentity,
        token: &str,
    ) -> LicenseResult<LicenseDecision> {
        if !self.anchor.verify(identity.as_str(), token)? {
            return Err(LicenseError::ResponseFormat(
                "issued license token does not verify for this client".to_string(),
            ));
        }

        match self.store.set(LICENSE_VALUE_NAME, token) {
            Ok(()) => info!("License token stored"),
            Err(e) => warn!(error = %e, "Could not store license token"),
        }
        Ok(LicenseDecision::Licensed)
    }

    fn trial_decision(
        &self,
        first_launch: &str,
        order_pending: bool,
        now: DateTime<Utc>,
    ) -> LicenseResult<LicenseDecision> {
        let start = parse_first_launch(first_launch)?;
        let days_left = days_left(start, self.trial_days, now);
        debug!(%start, days_left, order_pending, "Trial clock");

        if days_left > 0 {
            Ok(LicenseDecision::TrialActive {
                days_left,
                order_pending,
            })
        } else {
            Ok(LicenseDecision::Expired)
        }
    }
}
