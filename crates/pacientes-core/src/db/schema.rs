//! SQLite schema definition.

/// Complete database schema for the patient portal.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS pacientes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dni TEXT NOT NULL UNIQUE,
    nombre TEXT NOT NULL,
    apellido TEXT NOT NULL,
    sexo TEXT NOT NULL,
    fecnac TEXT,                                 -- YYYY-MM-DD
    email TEXT,
    telefono TEXT,
    calle TEXT,
    numero TEXT,
    piso TEXT,
    departamento TEXT,
    cpostal TEXT,
    barrio TEXT,
    ciudad TEXT,
    provincia TEXT,
    peso REAL,                                   -- kg
    talla REAL,                                  -- cm
    numeroafiliado TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_pacientes_apellido ON pacientes(apellido);

-- ============================================================================
-- Reference Data (read-only for the portal)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicos (
    matricula TEXT PRIMARY KEY,
    nombre TEXT NOT NULL,
    apellido TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vademecum (
    codigo TEXT PRIMARY KEY,
    monodroga TEXT,
    nombre_comercial TEXT,
    presentacion TEXT,
    laboratorio TEXT
);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS recetas (
    idreceta INTEGER PRIMARY KEY AUTOINCREMENT,
    num_receta_ofuscada TEXT UNIQUE,
    fechaemision TEXT NOT NULL DEFAULT (datetime('now')),
    matricprescr TEXT,                           -- not a FK: physicians may be unknown
    matricespec_prescr TEXT,
    idpaciente INTEGER NOT NULL REFERENCES pacientes(id),
    lugaratencion TEXT,
    diagnostico TEXT,
    diagnostico2 TEXT,
    estado TEXT,
    anulacionmotivo TEXT,
    bloqueo INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_recetas_paciente ON recetas(idpaciente);

CREATE TABLE IF NOT EXISTS receta_medicamentos (
    idrecetamedic INTEGER PRIMARY KEY AUTOINCREMENT,
    idreceta INTEGER NOT NULL REFERENCES recetas(idreceta) ON DELETE CASCADE,
    nro_orden INTEGER NOT NULL,
    idmedicamento INTEGER,
    codigo TEXT NOT NULL,                        -- vademecum code, may be missing there
    UNIQUE (idreceta, nro_orden)
);

-- ============================================================================
-- Studies
-- ============================================================================

CREATE TABLE IF NOT EXISTS estudios (
    idestudio INTEGER PRIMARY KEY AUTOINCREMENT,
    id_encriptado TEXT UNIQUE,
    fechaemision TEXT NOT NULL DEFAULT (datetime('now')),
    matricprescr TEXT,
    matricespec_prescr TEXT,
    idpaciente INTEGER NOT NULL REFERENCES pacientes(id),
    lugaratencion TEXT,
    diagnostico TEXT,
    diagnostico2 TEXT,
    estado TEXT,
    anulacionmotivo TEXT
);

CREATE INDEX IF NOT EXISTS idx_estudios_paciente ON estudios(idpaciente);

-- ============================================================================
-- Certificates
-- ============================================================================

CREATE TABLE IF NOT EXISTS certificados (
    idcertificado INTEGER PRIMARY KEY AUTOINCREMENT,
    id_encriptado TEXT UNIQUE,
    fechaemision TEXT NOT NULL DEFAULT (datetime('now')),
    matricprescr TEXT,
    matricespec_prescr TEXT,
    idpaciente INTEGER NOT NULL REFERENCES pacientes(id),
    lugaratencion TEXT,
    diagnostico TEXT,
    diagnostico2 TEXT,
    estado TEXT,
    anulacionmotivo TEXT
);

CREATE INDEX IF NOT EXISTS idx_certificados_paciente ON certificados(idpaciente);
"#;

/// Columns added after the first release, applied to older files on open.
pub const ADDED_COLUMNS: &[(&str, &str, &str)] = &[("pacientes", "numeroafiliado", "TEXT")];
