use sea_orm_migration::{prelude::*, sea_orm::Schema};

use crate::entity::{audit_logs, bookings, clients, drivers, users, vehicles};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children so foreign keys resolve.
        manager
            .create_table(schema.create_table_from_entity(users::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(clients::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(drivers::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(vehicles::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(bookings::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(audit_logs::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_client_id")
                    .table(bookings::Entity)
                    .col(bookings::Column::ClientId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_status_pickup")
                    .table(bookings::Entity)
                    .col(bookings::Column::Status)
                    .col(bookings::Column::PickupDatetime)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_clients_user_id")
                    .table(clients::Entity)
                    .col(clients::Column::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(audit_logs::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(bookings::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(vehicles::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(drivers::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(clients::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(users::Entity).to_owned())
            .await?;
        Ok(())
    }
}
