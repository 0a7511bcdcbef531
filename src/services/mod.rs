pub(crate) mod analytics;
pub(crate) mod attempt_finalize;
pub(crate) mod normalize;
pub(crate) mod quiz_builder;
pub(crate) mod scoring;
