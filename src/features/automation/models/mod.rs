pub mod workflow_action;
