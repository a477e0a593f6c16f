//! Table bootstrap for fresh databases. Creates missing tables only; column
//! changes on existing tables are out of its reach.

use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, Schema, Statement};

use crate::{entity::*, error::ApiError};

fn create_statement<E: EntityTrait>(backend: DbBackend, entity: E) -> Statement {
    let schema = Schema::new(backend);
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    backend.build(&table)
}

/// Creation statements in foreign key order.
pub fn statements(backend: DbBackend) -> Vec<Statement> {
    vec![
        create_statement(backend, user::Entity),
        create_statement(backend, string_item::Entity),
        create_statement(backend, stock_log::Entity),
        create_statement(backend, package::Entity),
        create_statement(backend, user_package::Entity),
        create_statement(backend, voucher::Entity),
        create_statement(backend, user_voucher::Entity),
        create_statement(backend, order::Entity),
        create_statement(backend, order_status_log::Entity),
        create_statement(backend, payment::Entity),
        create_statement(backend, gateway_event::Entity),
        create_statement(backend, points_log::Entity),
        create_statement(backend, referral_log::Entity),
        create_statement(backend, review::Entity),
        create_statement(backend, notification::Entity),
        create_statement(backend, error_report::Entity),
    ]
}

pub async fn sync(db: &impl ConnectionTrait) -> Result<(), ApiError> {
    let statements = statements(db.get_database_backend());
    let count = statements.len();
    for statement in statements {
        db.execute(statement).await?;
    }
    tracing::info!(tables = count, "Schema synchronised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_postgres_tables_in_dependency_order() {
        let sql: Vec<String> = statements(DbBackend::Postgres)
            .into_iter()
            .map(|s| s.sql)
            .collect();
        assert_eq!(sql.len(), 16);
        assert!(sql.iter().all(|s| s.starts_with("CREATE TABLE IF NOT EXISTS")));
        assert!(sql[0].contains(r#""public"."User""#));

        let position = |table: &str| {
            sql.iter()
                .position(|s| s.contains(&format!(r#""public"."{}" ("#, table)))
                .unwrap()
        };
        assert!(position("Order") > position("StringItem"));
        assert!(position("Payment") > position("UserPackage"));
        assert!(sql[position("Order")].contains(r#""finalPrice""#));
    }
}
