use crate::schema::db;

#[derive(Debug)]
pub struct Capability {
    /// Column storage types supported by the database
    pub storage_types: StorageTypes,

    /// The database can generate a key on insert and hand it back.
    pub auto_increment: bool,

    /// The database supports named sequences.
    pub sequences: bool,
}

#[derive(Debug)]
pub struct StorageTypes {
    /// The default storage type for a string.
    pub default_string_type: db::Type,

    /// The default storage type for a UUID.
    pub default_uuid_type: db::Type,

    /// When `Some` the database supports varchar types with the specified upper
    /// limit.
    pub varchar: Option<u64>,
}

impl Capability {
    /// Capabilities assumed when none are configured.
    pub const DEFAULT: Self = Self {
        storage_types: StorageTypes::DEFAULT,
        auto_increment: true,
        sequences: true,
    };

    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        storage_types: StorageTypes::SQLITE,
        auto_increment: true,
        sequences: false,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        storage_types: StorageTypes::POSTGRESQL,
        ..Self::DEFAULT
    };

    /// MySQL capabilities
    pub const MYSQL: Self = Self {
        storage_types: StorageTypes::MYSQL,
        ..Self::SQLITE
    };
}

impl StorageTypes {
    pub const DEFAULT: StorageTypes = StorageTypes {
        default_string_type: db::Type::Text,
        default_uuid_type: db::Type::Uuid,
        varchar: Some(10_485_760),
    };

    /// SQLite storage types
    pub const SQLITE: StorageTypes = StorageTypes {
        default_string_type: db::Type::Text,
        default_uuid_type: db::Type::Text,

        // SQLite ignores the length specifier of VARCHAR(N); the only hard
        // limit is SQLITE_MAX_LENGTH, 1 billion by default.
        varchar: Some(1_000_000_000),
    };

    pub const POSTGRESQL: StorageTypes = StorageTypes {
        default_string_type: db::Type::Text,
        default_uuid_type: db::Type::Uuid,

        // The maximum n you can specify is 10 485 760 characters.
        varchar: Some(10_485_760),
    };

    pub const MYSQL: StorageTypes = StorageTypes {
        default_string_type: db::Type::VarChar(191),
        default_uuid_type: db::Type::VarChar(36),

        // The effective maximum length of a VARCHAR is subject to the maximum
        // row size (65,535 bytes, shared among all columns).
        varchar: Some(65_535),
    };
}
