pub(crate) mod activity;
pub(crate) mod meta;
pub(crate) mod profile;
pub(crate) mod shared;
