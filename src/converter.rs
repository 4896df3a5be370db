//! Conversions between wire forms (DTOs) and storage forms (entities).
//!
//! Each pair is total and lossless on the fields both sides share, so
//! `CarDto::from(CarEntity::from(dto)) == dto` and likewise for accounts.
//! The storage-only account `id` is dropped on the way out and left unassigned
//! on the way in.

use crate::models::{AccountDto, AccountEntity, CarDto, CarEntity};

impl From<CarDto> for CarEntity {
    fn from(dto: CarDto) -> Self {
        CarEntity {
            id: dto.id,
            name: dto.name,
            year: dto.year,
            price: dto.price,
            description: dto.description,
            login: dto.login,
            enabled: dto.enabled,
        }
    }
}

impl From<CarEntity> for CarDto {
    fn from(entity: CarEntity) -> Self {
        CarDto {
            id: entity.id,
            name: entity.name,
            year: entity.year,
            price: entity.price,
            login: entity.login,
            description: entity.description,
            enabled: entity.enabled,
        }
    }
}

impl From<AccountDto> for AccountEntity {
    fn from(dto: AccountDto) -> Self {
        AccountEntity {
            id: None,
            login: dto.login,
            roles: dto.roles,
        }
    }
}

impl From<AccountEntity> for AccountDto {
    fn from(entity: AccountEntity) -> Self {
        AccountDto {
            login: entity.login,
            roles: entity.roles,
        }
    }
}
