pub(crate) mod attendance;
pub(crate) mod grading;
