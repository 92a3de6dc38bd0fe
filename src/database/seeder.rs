use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Group, Identity, Permission};
use crate::types::Status;

struct DemoPermission {
    name: &'static str,
    description: &'static str,
    resource: &'static str,
    action: &'static str,
}

struct DemoGroup {
    name: &'static str,
    description: &'static str,
    permissions: &'static [&'static str],
}

struct DemoIdentity {
    name: &'static str,
    email: &'static str,
    api_key: &'static str,
    group: &'static str,
    rate_limit: u32,
    status: Status,
    /// Days from now; negative means already expired
    expires_in_days: Option<i64>,
}

const PERMISSIONS: &[DemoPermission] = &[
    DemoPermission {
        name: "profile.read",
        description: "Read own profile",
        resource: "profile",
        action: "read",
    },
    DemoPermission {
        name: "access.manage",
        description: "Manage API key expiration and rate limits",
        resource: "access",
        action: "manage",
    },
];

const GROUPS: &[DemoGroup] = &[
    DemoGroup {
        name: "admin",
        description: "Administrators",
        permissions: &["profile.read", "access.manage"],
    },
    DemoGroup {
        name: "user",
        description: "Regular API consumers",
        permissions: &["profile.read"],
    },
];

const IDENTITIES: &[DemoIdentity] = &[
    DemoIdentity {
        name: "Admin User",
        email: "admin@example.com",
        api_key: "admin-api-key-789",
        group: "admin",
        rate_limit: 1000,
        status: Status::Active,
        expires_in_days: None,
    },
    DemoIdentity {
        name: "John Doe",
        email: "john@example.com",
        api_key: "test-api-key-123",
        group: "user",
        rate_limit: 120,
        status: Status::Active,
        expires_in_days: Some(90),
    },
    DemoIdentity {
        name: "Jane Smith",
        email: "jane@example.com",
        api_key: "test-api-key-456",
        group: "user",
        rate_limit: 60,
        status: Status::Active,
        expires_in_days: Some(-30),
    },
    DemoIdentity {
        name: "Bob Inactive",
        email: "bob@example.com",
        api_key: "test-api-key-000",
        group: "user",
        rate_limit: 120,
        status: Status::Inactive,
        expires_in_days: None,
    },
];

fn demo_groups() -> Vec<Group> {
    let permissions: Vec<Permission> = PERMISSIONS
        .iter()
        .zip(1..)
        .map(|(p, id)| Permission {
            id,
            name: p.name.to_string(),
            description: p.description.to_string(),
            resource: p.resource.to_string(),
            action: p.action.to_string(),
        })
        .collect();

    GROUPS
        .iter()
        .zip(1..)
        .map(|(g, id)| Group {
            id,
            name: g.name.to_string(),
            description: g.description.to_string(),
            permissions: permissions
                .iter()
                .filter(|p| g.permissions.contains(&p.name.as_str()))
                .cloned()
                .collect(),
        })
        .collect()
}

/// Demo identities with groups and permissions resolved, relative to `now`
pub fn demo_identities(now: DateTime<Utc>) -> Vec<Identity> {
    let groups = demo_groups();

    IDENTITIES
        .iter()
        .map(|d| {
            let group = groups.iter().find(|g| g.name == d.group).cloned();
            Identity {
                id: Uuid::new_v4(),
                name: d.name.to_string(),
                email: d.email.to_string(),
                api_key: d.api_key.to_string(),
                group_id: group.as_ref().map(|g| g.id),
                group,
                expired_date: d.expires_in_days.map(|days| now + Duration::days(days)),
                rate_limit: d.rate_limit,
                status_id: d.status.id(),
            }
        })
        .collect()
}

/// Insert demo permissions, groups and API keys. Existing rows are left alone.
pub async fn seed(pool: &PgPool) -> Result<(), DatabaseError> {
    info!("Starting database seeding...");

    let identities = demo_identities(Utc::now());
    let mut tx = pool.begin().await?;
    let mut group_ids: HashMap<String, i32> = HashMap::new();

    for identity in &identities {
        let group_id = match &identity.group {
            Some(group) => match group_ids.get(&group.name) {
                Some(id) => Some(*id),
                None => {
                    let id = upsert_group(&mut tx, group).await?;
                    group_ids.insert(group.name.clone(), id);
                    Some(id)
                }
            },
            None => None,
        };

        let inserted = sqlx::query(
            "INSERT INTO access (id, name, email, api_key, group_id, expired_date, rate_limit, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (api_key) DO NOTHING",
        )
        .bind(identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.api_key)
        .bind(group_id)
        .bind(identity.expired_date)
        .bind(i32::try_from(identity.rate_limit).unwrap_or(i32::MAX))
        .bind(identity.status_id)
        .execute(&mut *tx)
        .await?;

        let status = Status::from_id(identity.status_id)
            .map(Status::description)
            .unwrap_or("Unknown");
        if inserted.rows_affected() > 0 {
            info!("Seeded API key for {} ({})", identity.email, status);
        } else {
            info!("API key for {} already present, skipping", identity.email);
        }
    }

    tx.commit().await?;
    info!("Database seeding completed!");
    Ok(())
}

async fn upsert_group(conn: &mut PgConnection, group: &Group) -> Result<i32, DatabaseError> {
    let group_id: i32 = sqlx::query_scalar(
        "INSERT INTO groups (name, description, status_id)
         VALUES ($1, $2, $3)
         ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
         RETURNING id",
    )
    .bind(&group.name)
    .bind(&group.description)
    .bind(Status::Active.id())
    .fetch_one(&mut *conn)
    .await?;

    for permission in &group.permissions {
        let permission_id: i32 = sqlx::query_scalar(
            "INSERT INTO permissions (name, description, resource, action, status_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
             RETURNING id",
        )
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.resource)
        .bind(&permission.action)
        .bind(Status::Active.id())
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO group_permissions (group_id, permission_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(permission_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(group_id)
}
