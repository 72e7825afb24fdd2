mod client;
mod error;
mod fetcher;
mod model;
mod scheduler;

pub use client::HttpGraphApi;
pub use fetcher::{DataFetcher, Notice, NoticeKind};
pub use model::{Entity, GraphData, Relationship};
pub use scheduler::PollIntervals;
