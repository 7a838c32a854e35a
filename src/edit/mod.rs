pub(crate) mod execute;
pub(crate) mod locate;
pub(crate) mod recover;
pub(crate) mod source;
