// -
// Control-plane actions

pub const ACTION_STOP_NAMENODE: &str = "stop-namenode";
pub const ACTION_START_NAMENODE: &str = "start-namenode";
pub const ACTION_PREPARE_UPGRADE: &str = "prepare-upgrade";
pub const ACTION_QUERY: &str = "query";
pub const ACTION_UPGRADE: &str = "upgrade";
pub const ACTION_DOWNGRADE: &str = "downgrade";
pub const ACTION_FINALIZE: &str = "finalize";

/// Result field reported by `query` once the upgrade image is prepared
pub const READY_FIELD: &str = "ready";

// -
// Default role names

pub const DEFAULT_NAMENODE_ROLE: &str = "namenode";
pub const DEFAULT_RESOURCEMANAGER_ROLE: &str = "resourcemanager";
pub const DEFAULT_WORKER_ROLE: &str = "slave";
pub const DEFAULT_PLUGIN_ROLE: &str = "plugin";
pub const DEFAULT_CLIENT_ROLE: &str = "client";

// -
// Java processes, as listed by `pgrep -a java`

/// The leading dot tells it apart from SecondaryNameNode
pub const PROCESS_NAMENODE: &str = ".NameNode";
pub const PROCESS_RESOURCEMANAGER: &str = "ResourceManager";
pub const PROCESS_JOBHISTORY: &str = "JobHistoryServer";
pub const PROCESS_NODEMANAGER: &str = "NodeManager";
pub const PROCESS_DATANODE: &str = "DataNode";

pub const LIST_JAVA_PROCESSES: &str = "pgrep -a java";

// -
// Status wording

pub const WORKER_READY: &str = "Ready (DataNode & NodeManager)";
pub const PLUGIN_READY: &str = "Ready (HDFS & YARN)";
