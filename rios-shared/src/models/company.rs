/// Company model and database operations
///
/// Companies are the tenants' clients. Besides identification (`name`, `tipo`,
/// `nit`) a company carries the credentials the back office uses on its
/// behalf (tax portal, accounting software, mail server, social security).
///
/// The tenant's own organization is stored as a regular company, flagged by
/// `tipo = "Sistema"` or by the name "Empresa Principal". That row is
/// protected: it can be neither edited nor deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     tipo VARCHAR(50) NOT NULL DEFAULT 'A',
///     nit VARCHAR(50) NOT NULL,
///     cedula VARCHAR(50),
///     dian TEXT,
///     firma TEXT,
///     software_contable TEXT,
///     usuario TEXT NOT NULL,
///     contrasena TEXT NOT NULL,
///     servidor_correo TEXT NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     clave_correo TEXT,
///     clave_cc TEXT,
///     clave_ss TEXT,
///     clave_ica TEXT,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX companies_nit_key ON companies (lower(nit));
/// CREATE UNIQUE INDEX companies_email_key ON companies (lower(email));
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::entity::{require_fields, Entity, EntityKind, ModelError, UniqueKey};
use super::patch::{Patch, UpdateSet};

/// `tipo` of the protected system company
pub const SYSTEM_COMPANY_TIPO: &str = "Sistema";

/// Name of the protected system company
pub const SYSTEM_COMPANY_NAME: &str = "Empresa Principal";

/// `tipo` assigned when the client does not send one
pub const DEFAULT_TIPO: &str = "A";

/// Company record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,

    /// Free-form classification ("A", "B", "C", "Sistema", ...)
    pub tipo: String,

    /// Tax ID, unique case-insensitively
    pub nit: String,

    pub cedula: Option<String>,
    pub dian: Option<String>,
    pub firma: Option<String>,
    pub software_contable: Option<String>,
    pub usuario: String,
    #[serde(rename = "contraseña")]
    pub contrasena: String,
    pub servidor_correo: String,
    pub email: String,
    pub clave_correo: Option<String>,
    #[serde(rename = "claveCC")]
    pub clave_cc: Option<String>,
    #[serde(rename = "claveSS")]
    pub clave_ss: Option<String>,
    #[serde(rename = "claveICA")]
    pub clave_ica: Option<String>,

    /// Active flag
    #[serde(rename = "state")]
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a company
///
/// Every field is optional at the type level so that missing fields surface as
/// a single validation error listing all of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompany {
    pub name: Option<String>,
    pub tipo: Option<String>,
    pub nit: Option<String>,
    pub cedula: Option<String>,
    pub dian: Option<String>,
    pub firma: Option<String>,
    pub software_contable: Option<String>,
    pub usuario: Option<String>,
    #[serde(rename = "contraseña")]
    pub contrasena: Option<String>,
    pub servidor_correo: Option<String>,
    pub email: Option<String>,
    pub clave_correo: Option<String>,
    #[serde(rename = "claveCC")]
    pub clave_cc: Option<String>,
    #[serde(rename = "claveSS")]
    pub clave_ss: Option<String>,
    #[serde(rename = "claveICA")]
    pub clave_ica: Option<String>,

    /// Active flag, defaults to true; set by the request edge
    #[serde(skip)]
    pub active: Option<bool>,
}

/// Partial update of a company
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub tipo: Patch<String>,
    #[serde(default)]
    pub nit: Patch<String>,
    #[serde(default)]
    pub cedula: Patch<Option<String>>,
    #[serde(default)]
    pub dian: Patch<Option<String>>,
    #[serde(default)]
    pub firma: Patch<Option<String>>,
    #[serde(default)]
    pub software_contable: Patch<Option<String>>,
    #[serde(default)]
    pub usuario: Patch<String>,
    #[serde(default, rename = "contraseña")]
    pub contrasena: Patch<String>,
    #[serde(default)]
    pub servidor_correo: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub clave_correo: Patch<Option<String>>,
    #[serde(default, rename = "claveCC")]
    pub clave_cc: Patch<Option<String>>,
    #[serde(default, rename = "claveSS")]
    pub clave_ss: Patch<Option<String>>,
    #[serde(default, rename = "claveICA")]
    pub clave_ica: Patch<Option<String>>,

    /// Set by the request edge
    #[serde(skip)]
    pub active: Patch<bool>,
}

impl Company {
    fn required(&self) -> Result<(), ModelError> {
        require_fields(&[
            ("name", &Some(self.name.clone())),
            ("nit", &Some(self.nit.clone())),
            ("email", &Some(self.email.clone())),
            ("usuario", &Some(self.usuario.clone())),
            ("contraseña", &Some(self.contrasena.clone())),
            ("servidorCorreo", &Some(self.servidor_correo.clone())),
        ])
    }
}

impl Entity for Company {
    const KIND: EntityKind = EntityKind::Company;
    type Create = CreateCompany;
    type Patch = CompanyPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(input: CreateCompany, id: Uuid, now: DateTime<Utc>) -> Result<Self, ModelError> {
        require_fields(&[
            ("name", &input.name),
            ("nit", &input.nit),
            ("email", &input.email),
            ("usuario", &input.usuario),
            ("contraseña", &input.contrasena),
            ("servidorCorreo", &input.servidor_correo),
        ])?;

        let tipo = input
            .tipo
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TIPO.to_string());

        Ok(Self {
            id,
            name: input.name.unwrap_or_default().trim().to_string(),
            tipo,
            nit: input.nit.unwrap_or_default().trim().to_string(),
            cedula: input.cedula,
            dian: input.dian,
            firma: input.firma,
            software_contable: input.software_contable,
            usuario: input.usuario.unwrap_or_default(),
            contrasena: input.contrasena.unwrap_or_default(),
            servidor_correo: input.servidor_correo.unwrap_or_default(),
            email: input.email.unwrap_or_default().trim().to_string(),
            clave_correo: input.clave_correo,
            clave_cc: input.clave_cc,
            clave_ss: input.clave_ss,
            clave_ica: input.clave_ica,
            active: input.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, patch: CompanyPatch) -> Result<UpdateSet, ModelError> {
        let mut changes = UpdateSet::new();

        changes.apply("name", patch.name.map(|v| v.trim().to_string()), &mut self.name);
        changes.apply("tipo", patch.tipo.map(|v| v.trim().to_string()), &mut self.tipo);
        changes.apply("nit", patch.nit.map(|v| v.trim().to_string()), &mut self.nit);
        changes.apply("cedula", patch.cedula, &mut self.cedula);
        changes.apply("dian", patch.dian, &mut self.dian);
        changes.apply("firma", patch.firma, &mut self.firma);
        changes.apply("software_contable", patch.software_contable, &mut self.software_contable);
        changes.apply("usuario", patch.usuario, &mut self.usuario);
        changes.apply("contrasena", patch.contrasena, &mut self.contrasena);
        changes.apply("servidor_correo", patch.servidor_correo, &mut self.servidor_correo);
        changes.apply("email", patch.email.map(|v| v.trim().to_string()), &mut self.email);
        changes.apply("clave_correo", patch.clave_correo, &mut self.clave_correo);
        changes.apply("clave_cc", patch.clave_cc, &mut self.clave_cc);
        changes.apply("clave_ss", patch.clave_ss, &mut self.clave_ss);
        changes.apply("clave_ica", patch.clave_ica, &mut self.clave_ica);
        changes.apply("active", patch.active, &mut self.active);

        Ok(changes)
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.required()
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey {
                column: "nit",
                value: self.nit.clone(),
            },
            UniqueKey {
                column: "email",
                value: self.email.clone(),
            },
        ]
    }

    fn is_protected(&self) -> bool {
        self.tipo == SYSTEM_COMPANY_TIPO || self.name == SYSTEM_COMPANY_NAME
    }
}

const COMPANY_COLUMNS: &str = "id, name, tipo, nit, cedula, dian, firma, software_contable, \
    usuario, contrasena, servidor_correo, email, clave_correo, clave_cc, clave_ss, clave_ica, \
    active, created_at, updated_at";

impl Company {
    /// Inserts a fully built company row
    pub async fn insert(pool: &PgPool, company: &Company) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies ({COMPANY_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.tipo)
        .bind(&company.nit)
        .bind(&company.cedula)
        .bind(&company.dian)
        .bind(&company.firma)
        .bind(&company.software_contable)
        .bind(&company.usuario)
        .bind(&company.contrasena)
        .bind(&company.servidor_correo)
        .bind(&company.email)
        .bind(&company.clave_correo)
        .bind(&company.clave_cc)
        .bind(&company.clave_ss)
        .bind(&company.clave_ica)
        .bind(company.active)
        .bind(company.created_at)
        .bind(company.updated_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a company by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all companies, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Writes the supplied columns of a merged row
    ///
    /// Returns `None` if the row disappeared since it was read.
    pub async fn update_columns(
        pool: &PgPool,
        company: &Company,
        changes: &UpdateSet,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE companies SET updated_at = ");
        query.push_bind(company.updated_at);

        for column in changes.columns() {
            query.push(", ").push(*column).push(" = ");
            match *column {
                "name" => query.push_bind(company.name.clone()),
                "tipo" => query.push_bind(company.tipo.clone()),
                "nit" => query.push_bind(company.nit.clone()),
                "cedula" => query.push_bind(company.cedula.clone()),
                "dian" => query.push_bind(company.dian.clone()),
                "firma" => query.push_bind(company.firma.clone()),
                "software_contable" => query.push_bind(company.software_contable.clone()),
                "usuario" => query.push_bind(company.usuario.clone()),
                "contrasena" => query.push_bind(company.contrasena.clone()),
                "servidor_correo" => query.push_bind(company.servidor_correo.clone()),
                "email" => query.push_bind(company.email.clone()),
                "clave_correo" => query.push_bind(company.clave_correo.clone()),
                "clave_cc" => query.push_bind(company.clave_cc.clone()),
                "clave_ss" => query.push_bind(company.clave_ss.clone()),
                "clave_ica" => query.push_bind(company.clave_ica.clone()),
                "active" => query.push_bind(company.active),
                other => return Err(sqlx::Error::ColumnNotFound(other.to_string())),
            };
        }

        query
            .push(" WHERE id = ")
            .push_bind(company.id)
            .push(" RETURNING ")
            .push(COMPANY_COLUMNS);

        query.build_query_as::<Company>().fetch_optional(pool).await
    }

    /// Deletes a company by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input() -> CreateCompany {
        CreateCompany {
            name: Some("Acme".to_string()),
            nit: Some("900.1-1".to_string()),
            email: Some("a@acme.com".to_string()),
            usuario: Some("acme".to_string()),
            contrasena: Some("secreta".to_string()),
            servidor_correo: Some("mail.acme.com".to_string()),
            dian: Some("dian-pass".to_string()),
            ..Default::default()
        }
    }

    fn company() -> Company {
        Company::build(full_input(), Uuid::new_v4(), Utc::now()).unwrap()
    }

    #[test]
    fn test_build_defaults() {
        let c = company();
        assert_eq!(c.tipo, DEFAULT_TIPO);
        assert!(c.active);
        assert!(!c.is_protected());
    }

    #[test]
    fn test_build_reports_every_missing_field() {
        let input = CreateCompany {
            name: Some("Acme".to_string()),
            nit: Some("900.1-1".to_string()),
            email: Some("a@acme.com".to_string()),
            ..Default::default()
        };

        let err = Company::build(input, Uuid::new_v4(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingFields(vec!["usuario", "contraseña", "servidorCorreo"])
        );
    }

    #[test]
    fn test_merge_keeps_omitted_fields() {
        let mut c = company();
        let patch = CompanyPatch {
            name: Patch::Present("Acme SAS".to_string()),
            ..Default::default()
        };

        let changes = c.merge(patch).unwrap();
        assert_eq!(changes.columns(), &["name"]);
        assert_eq!(c.name, "Acme SAS");
        assert_eq!(c.dian.as_deref(), Some("dian-pass"));
    }

    #[test]
    fn test_merge_trims_identifying_fields() {
        let mut c = company();
        c.merge(CompanyPatch {
            name: Patch::Present(format!("{} ", SYSTEM_COMPANY_NAME)),
            nit: Patch::Present("  901  ".to_string()),
            email: Patch::Present(" b@acme.com ".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(c.nit, "901");
        assert_eq!(c.email, "b@acme.com");
        assert_eq!(c.name, SYSTEM_COMPANY_NAME);
        assert!(c.is_protected());
    }

    #[test]
    fn test_merge_writes_empty_and_false() {
        let mut c = company();
        let patch = CompanyPatch {
            dian: Patch::Present(Some(String::new())),
            firma: Patch::Present(None),
            active: Patch::Present(false),
            ..Default::default()
        };

        let changes = c.merge(patch).unwrap();
        assert_eq!(c.dian.as_deref(), Some(""));
        assert_eq!(c.firma, None);
        assert!(!c.active);
        assert_eq!(changes.columns(), &["dian", "firma", "active"]);
    }

    #[test]
    fn test_blank_required_field_fails_validation() {
        let mut c = company();
        c.merge(CompanyPatch {
            nit: Patch::Present("  ".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(c.validate().unwrap_err(), ModelError::MissingFields(vec!["nit"]));
    }

    #[test]
    fn test_protected_company() {
        let mut c = company();
        c.tipo = SYSTEM_COMPANY_TIPO.to_string();
        assert!(c.is_protected());

        let mut c = company();
        c.name = SYSTEM_COMPANY_NAME.to_string();
        assert!(c.is_protected());
    }

    #[test]
    fn test_patch_deserializes_wire_names() {
        let patch: CompanyPatch = serde_json::from_str(
            r#"{"contraseña": "", "claveICA": null, "softwareContable": "Siigo"}"#,
        )
        .unwrap();

        assert_eq!(patch.contrasena, Patch::Present(String::new()));
        assert_eq!(patch.clave_ica, Patch::Present(None));
        assert_eq!(patch.software_contable, Patch::Present(Some("Siigo".to_string())));
        assert_eq!(patch.name, Patch::Missing);
    }

    #[test]
    fn test_serializes_state_and_wire_names() {
        let json = serde_json::to_value(company()).unwrap();
        assert_eq!(json["state"], true);
        assert_eq!(json["contraseña"], "secreta");
        assert!(json.get("claveCC").is_some());
        assert!(json.get("servidorCorreo").is_some());
    }
}
