use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxUserRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxGeneratedAssetRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxSavedAssetRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxPromoCodeRepo {
    pub pool: PgPool,
}
