use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::account::LocalAccount;
use crate::error::{Error, Result};

const SCHEMA: &str = "
    CREATE TABLE LocalAccount (
        id          INTEGER NOT NULL PRIMARY KEY,
        email       TEXT NOT NULL,
        identity_id TEXT NOT NULL,
        zone        TEXT NOT NULL,
        locale      TEXT
    );
    CREATE INDEX idx_local_account_email ON LocalAccount (email);
    CREATE INDEX idx_local_account_identity_id ON LocalAccount (identity_id);
";

/// Durable store of the local account mirrors. Point lookups by primary key
/// or by login email, single record transactional writes, nothing else.
#[derive(Clone)]
pub struct MirrorStore {
    conn: Arc<Mutex<Connection>>,
}

impl MirrorStore {
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let mut conn = conn;
        Migrations::new(vec![M::up(SCHEMA)]).to_latest(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Saves the mirror record in a single transaction. An existing record
    /// with the same ID is updated, otherwise a new one is inserted. All
    /// fields are written in the one statement.
    pub fn save(&self, account: &LocalAccount) -> Result<()> {
        let mut conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let tx = conn.transaction()?;

        let exists = tx
            .prepare("SELECT 1 FROM LocalAccount WHERE id = ? LIMIT 1")?
            .exists([account.id])?;

        let sql = if exists {
            "UPDATE LocalAccount SET email = :email, identity_id = :identity_id,
                 zone = :zone, locale = :locale WHERE id = :id"
        } else {
            "INSERT INTO LocalAccount (id, email, identity_id, zone, locale)
                 VALUES (:id, :email, :identity_id, :zone, :locale)"
        };

        let params = serde_rusqlite::to_params_named(account)?;
        tx.execute(sql, params.to_slice().as_slice())?;
        tx.commit()?;

        Ok(())
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<LocalAccount>> {
        self.load("SELECT * FROM LocalAccount WHERE id = ?", [id])
    }

    /// Lookup by the secondarily indexed login email. Returns the first
    /// match; the email is unique in practice.
    pub fn get_by_email(&self, email: &str) -> Result<Option<LocalAccount>> {
        self.load("SELECT * FROM LocalAccount WHERE email = ? LIMIT 1", [email])
    }

    /// Deletes the mirror record. A store level capability only, the
    /// reconciliation core never removes records.
    pub fn delete(&self, id: i64) -> Result<()> {
        let mut conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM LocalAccount WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(())
    }

    fn load<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Option<LocalAccount>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        match rows.next()? {
            Some(row) => Ok(Some(serde_rusqlite::from_row(row)?)),
            None => Ok(None),
        }
    }
}
