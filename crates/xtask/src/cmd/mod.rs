mod snapshots;

pub(crate) use snapshots::{check_snapshots, update_snapshots};
