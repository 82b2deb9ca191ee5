use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_store_tables::Migration),
            Box::new(m20240101_000002_seed_sample_data::Migration),
        ]
    }
}

mod m20240101_000001_create_store_tables {
    use sea_orm_migration::prelude::*;

    use crate::schema;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_store_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for stmt in schema::create_table_statements() {
                manager.create_table(stmt).await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for stmt in schema::drop_table_statements() {
                manager.drop_table(stmt).await?;
            }
            Ok(())
        }
    }
}

mod m20240101_000002_seed_sample_data {
    use sea_orm_migration::prelude::*;

    use crate::schema;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_seed_sample_data"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            schema::seed_sample_data(manager.get_connection()).await?;
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            schema::remove_sample_data(manager.get_connection()).await
        }
    }
}
