use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::tenant_addons;

/// Purchased add-on. Add-ons cannot outlive the subscription they ride on,
/// except those sold for a flat duration.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = tenant_addons)]
pub struct TenantAddonEntity {
    pub id: i64,
    pub tenant_id: Uuid,
    pub name: String,
    pub flat_duration: bool,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tenant_addons)]
pub struct InsertTenantAddonEntity {
    pub tenant_id: Uuid,
    pub name: String,
    pub flat_duration: bool,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}
