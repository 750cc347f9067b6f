use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_properties_table::Migration),
            Box::new(m20240101_000003_create_folders_and_documents_tables::Migration),
            Box::new(m20240101_000004_create_tenant_tables::Migration),
            Box::new(m20240101_000005_create_task_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string_len(150)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Email).string_len(254).not_null())
                        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::LastLogin)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        Email,
        PasswordHash,
        IsActive,
        LastLogin,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_properties_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_properties_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Properties::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Properties::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Properties::Name)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Properties::Address).string_len(255).not_null())
                        .col(ColumnDef::new(Properties::Postcode).string_len(10).not_null())
                        .col(ColumnDef::new(Properties::City).string_len(100).null())
                        .col(ColumnDef::new(Properties::County).string_len(100).null())
                        .col(
                            ColumnDef::new(Properties::PropertyType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Properties::NumberOfUnits)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Properties::PurchaseDate).date().null())
                        .col(
                            ColumnDef::new(Properties::PurchasePrice)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Properties::BuildingInsuranceExpiryDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Properties::GasCertificateExpiryDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Properties::ElectricCertificateExpiryDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Properties::EpcCertificateExpiryDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Properties::FraCertificateExpiryDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Properties::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Properties::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Properties::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Properties {
        Table,
        Id,
        Name,
        Address,
        Postcode,
        City,
        County,
        PropertyType,
        NumberOfUnits,
        PurchaseDate,
        PurchasePrice,
        BuildingInsuranceExpiryDate,
        GasCertificateExpiryDate,
        ElectricCertificateExpiryDate,
        EpcCertificateExpiryDate,
        FraCertificateExpiryDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_folders_and_documents_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_folders_and_documents_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Folders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Folders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Folders::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Folders::PropertyId).uuid().not_null())
                        .col(ColumnDef::new(Folders::ParentId).uuid().null())
                        .col(
                            ColumnDef::new(Folders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_folders_property_id")
                                .from(Folders::Table, Folders::PropertyId)
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_folders_parent_id")
                                .from(Folders::Table, Folders::ParentId)
                                .to(Folders::Table, Folders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Sibling names are unique; NULL parents are checked by the service.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_folders_name_property_parent")
                        .table(Folders::Table)
                        .col(Folders::Name)
                        .col(Folders::PropertyId)
                        .col(Folders::ParentId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_folders_parent_id")
                        .table(Folders::Table)
                        .col(Folders::ParentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Documents::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Documents::PropertyId).uuid().not_null())
                        .col(ColumnDef::new(Documents::FolderId).uuid().null())
                        .col(ColumnDef::new(Documents::File).string_len(500).not_null())
                        .col(
                            ColumnDef::new(Documents::OriginalName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Documents::Description).string_len(255).null())
                        .col(
                            ColumnDef::new(Documents::UploadedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_documents_property_id")
                                .from(Documents::Table, Documents::PropertyId)
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_documents_folder_id")
                                .from(Documents::Table, Documents::FolderId)
                                .to(Folders::Table, Folders::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_folder_id")
                        .table(Documents::Table)
                        .col(Documents::FolderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_property_id")
                        .table(Documents::Table)
                        .col(Documents::PropertyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Folders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Properties {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Folders {
        Table,
        Id,
        Name,
        PropertyId,
        ParentId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Documents {
        Table,
        Id,
        PropertyId,
        FolderId,
        File,
        OriginalName,
        Description,
        UploadedAt,
    }
}

mod m20240101_000004_create_tenant_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_tenant_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tenants::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Tenants::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Tenants::FirstName).string_len(50).not_null())
                        .col(ColumnDef::new(Tenants::LastName).string_len(50).not_null())
                        .col(ColumnDef::new(Tenants::Phone).string_len(15).not_null())
                        .col(ColumnDef::new(Tenants::Email).string_len(100).not_null())
                        .col(ColumnDef::new(Tenants::Address).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Tenants::City)
                                .string_len(50)
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Tenants::County)
                                .string_len(50)
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(Tenants::Postcode).string_len(10).not_null())
                        .col(ColumnDef::new(Tenants::NextOfKin).string_len(50).null())
                        .col(ColumnDef::new(Tenants::MoveInDate).date().not_null())
                        .col(ColumnDef::new(Tenants::KeyCollection).date().not_null())
                        .col(ColumnDef::new(Tenants::MoveOutDate).date().null())
                        .col(ColumnDef::new(Tenants::KeyDropOff).date().null())
                        .col(
                            ColumnDef::new(Tenants::CurrentResidence)
                                .string_len(255)
                                .not_null()
                                .default("Unknown"),
                        )
                        .col(
                            ColumnDef::new(Tenants::OccupancyStatus)
                                .string_len(20)
                                .not_null()
                                .default("Vacant"),
                        )
                        .col(
                            ColumnDef::new(Tenants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tenants_last_first_name")
                        .table(Tenants::Table)
                        .col(Tenants::LastName)
                        .col(Tenants::FirstName)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TenantImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TenantImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TenantImages::TenantId).uuid().not_null())
                        .col(ColumnDef::new(TenantImages::Image).string_len(500).not_null())
                        .col(
                            ColumnDef::new(TenantImages::Category)
                                .string_len(20)
                                .not_null()
                                .default("other"),
                        )
                        .col(
                            ColumnDef::new(TenantImages::Description)
                                .string_len(255)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TenantImages::UploadedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tenant_images_tenant_id")
                                .from(TenantImages::Table, TenantImages::TenantId)
                                .to(Tenants::Table, Tenants::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TenantPropertyRelationships::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TenantPropertyRelationships::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TenantPropertyRelationships::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TenantPropertyRelationships::PropertyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TenantPropertyRelationships::MoveInDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TenantPropertyRelationships::MoveOutDate)
                                .date()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tenancies_tenant_id")
                                .from(
                                    TenantPropertyRelationships::Table,
                                    TenantPropertyRelationships::TenantId,
                                )
                                .to(Tenants::Table, Tenants::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tenancies_property_id")
                                .from(
                                    TenantPropertyRelationships::Table,
                                    TenantPropertyRelationships::PropertyId,
                                )
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_tenancies_tenant_property_move_in")
                        .table(TenantPropertyRelationships::Table)
                        .col(TenantPropertyRelationships::TenantId)
                        .col(TenantPropertyRelationships::PropertyId)
                        .col(TenantPropertyRelationships::MoveInDate)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(TenantPropertyRelationships::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(TenantImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Tenants::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Properties {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Tenants {
        Table,
        Id,
        FirstName,
        LastName,
        Phone,
        Email,
        Address,
        City,
        County,
        Postcode,
        NextOfKin,
        MoveInDate,
        KeyCollection,
        MoveOutDate,
        KeyDropOff,
        CurrentResidence,
        OccupancyStatus,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum TenantImages {
        Table,
        Id,
        TenantId,
        Image,
        Category,
        Description,
        UploadedAt,
    }

    #[derive(DeriveIden)]
    enum TenantPropertyRelationships {
        Table,
        Id,
        TenantId,
        PropertyId,
        MoveInDate,
        MoveOutDate,
    }
}

mod m20240101_000005_create_task_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_task_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tasks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Tasks::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Tasks::JobId)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Tasks::PropertyId).uuid().not_null())
                        .col(ColumnDef::new(Tasks::TenantId).uuid().null())
                        .col(ColumnDef::new(Tasks::DateIssueReported).date().not_null())
                        .col(ColumnDef::new(Tasks::DescriptionOfIssue).text().not_null())
                        .col(ColumnDef::new(Tasks::JobAllocated).string_len(20).null())
                        .col(ColumnDef::new(Tasks::DateCompleted).date().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tasks_property_id")
                                .from(Tasks::Table, Tasks::PropertyId)
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tasks_tenant_id")
                                .from(Tasks::Table, Tasks::TenantId)
                                .to(Tenants::Table, Tenants::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tasks_date_issue_reported")
                        .table(Tasks::Table)
                        .col(Tasks::DateIssueReported)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TaskImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TaskImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TaskImages::TaskId).uuid().not_null())
                        .col(ColumnDef::new(TaskImages::Image).string_len(500).not_null())
                        .col(ColumnDef::new(TaskImages::ImageType).string_len(20).not_null())
                        .col(
                            ColumnDef::new(TaskImages::UploadedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_task_images_task_id")
                                .from(TaskImages::Table, TaskImages::TaskId)
                                .to(Tasks::Table, Tasks::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TaskImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Tasks::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Properties {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Tenants {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Tasks {
        Table,
        Id,
        JobId,
        PropertyId,
        TenantId,
        DateIssueReported,
        DescriptionOfIssue,
        JobAllocated,
        DateCompleted,
    }

    #[derive(DeriveIden)]
    enum TaskImages {
        Table,
        Id,
        TaskId,
        Image,
        ImageType,
        UploadedAt,
    }
}
