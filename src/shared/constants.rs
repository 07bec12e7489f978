/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - full access to every ticket operation
pub const ROLE_ADMIN: &str = "admin";

/// Agent role - works tickets: updates properties, deletes, lists all tickets
pub const ROLE_AGENT: &str = "agent";

/// Customer role - opens tickets, reads them and adds attachments
pub const ROLE_CUSTOMER: &str = "customer";
