// storage/src/registry.rs
//! Owner and pet registry.

use rusqlite::{OptionalExtension, Row, params};

use models::{Owner, Pet};

use crate::{Database, StorageError, StorageResult};

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
    })
}

fn pet_from_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        age: row.get(5)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewOwner {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPet {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
}

impl Database {
    pub fn create_owner(&self, new: &NewOwner) -> StorageResult<Owner> {
        self.conn.execute(
            "INSERT INTO owners (name, phone, email, address) VALUES (?1, ?2, ?3, ?4)",
            params![new.name, new.phone, new.email, new.address],
        )?;
        self.get_owner(self.conn.last_insert_rowid())
    }

    pub fn get_owner(&self, owner_id: i64) -> StorageResult<Owner> {
        self.find_owner(owner_id)?
            .ok_or_else(|| StorageError::NotFound("Owner not found".into()))
    }

    pub fn find_owner(&self, owner_id: i64) -> StorageResult<Option<Owner>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, phone, email, address FROM owners WHERE id = ?1",
                [owner_id],
                owner_from_row,
            )
            .optional()?)
    }

    pub fn find_owner_by_phone(&self, phone: &str) -> StorageResult<Option<Owner>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, phone, email, address FROM owners WHERE phone = ?1",
                [phone],
                owner_from_row,
            )
            .optional()?)
    }

    /// Newest-registered owners first.
    pub fn list_owners(&self) -> StorageResult<Vec<Owner>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, phone, email, address FROM owners ORDER BY id DESC")?;
        let rows = stmt.query_map([], owner_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Exact-match search on phone and/or email. With neither filter this
    /// returns every owner.
    pub fn search_owners(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> StorageResult<Vec<Owner>> {
        let mut sql = String::from("SELECT id, name, phone, email, address FROM owners WHERE 1=1");
        let mut args: Vec<&dyn rusqlite::ToSql> = Vec::new();
        if let Some(phone) = &phone {
            sql.push_str(" AND phone = ?");
            args.push(phone);
        }
        if let Some(email) = &email {
            sql.push_str(" AND email = ?");
            args.push(email);
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(&args[..], owner_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Creates a pet under an owner; fails if the owner does not exist.
    pub fn create_pet(&self, owner_id: i64, new: &NewPet) -> StorageResult<Pet> {
        self.get_owner(owner_id)?;
        self.conn.execute(
            "INSERT INTO pets (owner_id, name, species, breed, age) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![owner_id, new.name, new.species, new.breed, new.age],
        )?;
        self.get_pet(self.conn.last_insert_rowid())
    }

    pub fn get_pet(&self, pet_id: i64) -> StorageResult<Pet> {
        self.find_pet(pet_id)?
            .ok_or_else(|| StorageError::NotFound("Pet not found".into()))
    }

    pub fn find_pet(&self, pet_id: i64) -> StorageResult<Option<Pet>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, owner_id, name, species, breed, age FROM pets WHERE id = ?1",
                [pet_id],
                pet_from_row,
            )
            .optional()?)
    }

    pub fn find_pet_by_name(&self, owner_id: i64, name: &str) -> StorageResult<Option<Pet>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, owner_id, name, species, breed, age FROM pets
                 WHERE owner_id = ?1 AND name = ?2",
                params![owner_id, name],
                pet_from_row,
            )
            .optional()?)
    }

    pub fn list_pets(&self, owner_id: i64) -> StorageResult<Vec<Pet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, name, species, breed, age FROM pets WHERE owner_id = ?1",
        )?;
        let rows = stmt.query_map([owner_id], pet_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}
