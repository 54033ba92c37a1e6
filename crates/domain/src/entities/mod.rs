mod audience;
mod campaign;
mod deferred_message;
mod send;
mod sender_account;
mod sequence;
mod thread;

pub use audience::{Contact, PlatformUser};
pub use campaign::{
    Campaign, CampaignStats, CampaignStatus, DirectoryFilter, ManualRecipient, PlatformFilter,
    SendWindow, SenderMode, TargetingConfig, TimingConfig, TimingStrategy,
};
pub use deferred_message::{DeferredMessage, DeferredStatus};
pub use send::{CampaignSend, RecipientSource, SendStatus};
pub use sender_account::{CampaignSenderLink, SenderAccount};
pub use sequence::{EnrollmentStatus, SequenceEnrollment, SequenceStep};
pub use thread::{Thread, ThreadMessage};
