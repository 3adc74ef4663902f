use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    Id,
    Guid,
    Name,
    Email,
    Picture,
}

#[derive(Iden, Clone, Copy)]
pub enum Notes {
    Table,
    Id,
    OwnerId,
    Contents,
}

#[derive(Iden, Clone, Copy)]
pub enum Posts {
    Table,
    Id,
    AuthorId,
    Contents,
}
