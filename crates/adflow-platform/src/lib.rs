pub mod client;
pub mod error;
pub mod tools;

pub use client::{
    AdSetSpec, Budget, CampaignSpec, CampaignStatus, CreativeSpec, DateRange, MetaAdsClient,
    PlatformCredentials, Schedule, TargetingTerm,
};
pub use error::PlatformError;
pub use tools::platform_tools;
