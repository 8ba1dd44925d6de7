//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`ProviderRanker`]: reputation ranking and candidate selection
//! - [`InvitationWorkflow`]: Top-N invitations, cancellation, extra invites
//! - [`QuoteSubmissionService`]: quote upsert and downstream fan-out
//! - [`RatingBatchService`]: rating batches
//! - [`ProviderSyncService`]: provider mirror from the providers module
//! - [`CatalogSyncService`]: categories, skills and zones from the catalogue
//! - [`SubscriptionService`]: manual broker subscriptions
//! - [`SubscriptionReconciler`]: startup subscription reconciliation
//! - [`WebhookIntake`]: webhook receive, ack and dispatch
//! - [`Top3Publisher`]: publication of Top-3 results and quote summaries

pub mod batch;
pub mod catalog_sync;
pub mod invitation_workflow;
pub mod provider_ranking;
pub mod provider_sync;
pub mod quote_submission;
pub mod rating_batch;
pub mod subscription_reconciler;
pub mod subscriptions;
pub mod top3_publisher;
pub mod webhook_intake;

#[cfg(test)]
mod testing;

pub use batch::{BatchItemError, BatchReport};
pub use catalog_sync::{CatalogSyncService, NamedEntry, SkillEntry, SyncMode};
pub use invitation_workflow::{InvitationWorkflow, RequestCreatedEvent, Top3Result};
pub use provider_ranking::{
    ProviderRanker, ProviderRankingStrategy, RankedProvider, ReputationStrategy,
};
pub use provider_sync::{
    CategoryRef, ProviderSyncRequest, ProviderSyncService, SkillRef, UserProfile,
};
pub use quote_submission::{FanOutReport, QuoteReceipt, QuoteSubmission, QuoteSubmissionService};
pub use rating_batch::{RatingBatchItem, RatingBatchService};
pub use subscription_reconciler::{ReconcileReport, ReconcileSkip, SubscriptionReconciler};
pub use subscriptions::{
    SubscriptionCommand, SubscriptionListing, SubscriptionResult, SubscriptionService,
};
pub use top3_publisher::{PublishResult, Top3Publisher};
pub use webhook_intake::{EventHandlers, WebhookIntake, WebhookReceipt};
