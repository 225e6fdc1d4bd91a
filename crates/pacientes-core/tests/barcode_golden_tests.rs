//! Golden tests for the DNI barcode parser.
//!
//! Payloads mirror what PDF417 readers return for real documents.

use pacientes_core::barcode::{parse_barcode, BarcodeError};
use pacientes_core::dates;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    payload: &'static str,
    expected_dni: &'static str,
    expected_apellido: Option<&'static str>,
    expected_nombre: Option<&'static str>,
    expected_genero: Option<&'static str>,
    expected_fecha_nac: Option<&'static str>,
    expected_iso: Option<&'static str>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "current-format",
            payload: "00610299988@JAIME@FEDERICO NICOLAS@M@38437748@C@22/09/1994@28/09/2019@204",
            expected_dni: "38437748",
            expected_apellido: Some("JAIME"),
            expected_nombre: Some("FEDERICO NICOLAS"),
            expected_genero: Some("M"),
            expected_fecha_nac: Some("22/09/1994"),
            expected_iso: Some("1994-09-22"),
        },
        GoldenCase {
            id: "seven-digit-dni",
            payload: "00123456789@PEREZ@MARIA LUISA@F@7654321@A@01/02/1950@15/06/2015@201",
            expected_dni: "7654321",
            expected_apellido: Some("PEREZ"),
            expected_nombre: Some("MARIA LUISA"),
            expected_genero: Some("F"),
            expected_fecha_nac: Some("01/02/1950"),
            expected_iso: Some("1950-02-01"),
        },
        GoldenCase {
            id: "minimal-five-fields",
            payload: "0001@GOMEZ@JUAN@M@12345678",
            expected_dni: "12345678",
            expected_apellido: Some("GOMEZ"),
            expected_nombre: Some("JUAN"),
            expected_genero: Some("M"),
            expected_fecha_nac: None,
            expected_iso: None,
        },
        GoldenCase {
            id: "six-fields-no-birth-date",
            payload: "0001@GOMEZ@JUAN@M@12345678@B",
            expected_dni: "12345678",
            expected_apellido: Some("GOMEZ"),
            expected_nombre: Some("JUAN"),
            expected_genero: Some("M"),
            expected_fecha_nac: None,
            expected_iso: None,
        },
        GoldenCase {
            id: "accented-names",
            payload: "00200000001@NUÑEZ@JOSÉ MARÍA@M@23456789@A@31/12/1988@01/01/2020@300",
            expected_dni: "23456789",
            expected_apellido: Some("NUÑEZ"),
            expected_nombre: Some("JOSÉ MARÍA"),
            expected_genero: Some("M"),
            expected_fecha_nac: Some("31/12/1988"),
            expected_iso: Some("1988-12-31"),
        },
        GoldenCase {
            id: "unparseable-birth-date",
            payload: "0001@GOMEZ@JUAN@M@12345678@B@00/00/0000",
            expected_dni: "12345678",
            expected_apellido: Some("GOMEZ"),
            expected_nombre: Some("JUAN"),
            expected_genero: Some("M"),
            expected_fecha_nac: Some("00/00/0000"),
            expected_iso: None,
        },
        GoldenCase {
            id: "digit-run-fallback",
            payload: "no-delimiter-here but 87654321 present",
            expected_dni: "87654321",
            expected_apellido: None,
            expected_nombre: None,
            expected_genero: None,
            expected_fecha_nac: None,
            expected_iso: None,
        },
    ]
}

#[test]
fn test_golden_cases() {
    for case in get_golden_cases() {
        let identity = parse_barcode(case.payload)
            .unwrap_or_else(|e| panic!("Case {}: unexpected error {}", case.id, e));

        assert_eq!(identity.dni, case.expected_dni, "Case {}: dni mismatch", case.id);
        assert_eq!(
            identity.apellido.as_deref(), case.expected_apellido,
            "Case {}: apellido mismatch", case.id
        );
        assert_eq!(
            identity.nombre.as_deref(), case.expected_nombre,
            "Case {}: nombre mismatch", case.id
        );
        assert_eq!(
            identity.genero.as_deref(), case.expected_genero,
            "Case {}: genero mismatch", case.id
        );
        assert_eq!(
            identity.fecha_nac.as_deref(), case.expected_fecha_nac,
            "Case {}: fecha_nac mismatch", case.id
        );

        let iso = identity.fecha_nac.as_deref().and_then(dates::to_iso);
        assert_eq!(iso.as_deref(), case.expected_iso, "Case {}: iso mismatch", case.id);
    }
}

#[test]
fn test_rejected_payloads() {
    let rejected = vec![
        ("a@b@c", BarcodeError::InsufficientFields { found: 3 }),
        ("@", BarcodeError::InsufficientFields { found: 2 }),
        (
            "id@AP@NOM@M@123456@X@01/02/1990",
            BarcodeError::InvalidDniFormat("123456".to_string()),
        ),
        (
            "id@AP@NOM@M@ 12345678@X",
            BarcodeError::InvalidDniFormat(" 12345678".to_string()),
        ),
        ("", BarcodeError::UnrecognizedFormat),
        ("QR-CODE-123", BarcodeError::UnrecognizedFormat),
        ("phone 1134567890", BarcodeError::UnrecognizedFormat),
    ];

    for (payload, expected) in rejected {
        assert_eq!(
            parse_barcode(payload),
            Err(expected),
            "Payload {:?}: wrong error",
            payload
        );
    }
}

#[test]
fn test_every_error_has_a_hint() {
    let errors = vec![
        BarcodeError::InvalidDniFormat("1".into()),
        BarcodeError::InsufficientFields { found: 1 },
        BarcodeError::UnrecognizedFormat,
    ];
    for error in errors {
        assert!(!error.retry_hint().is_empty(), "{:?} has no hint", error);
    }
}
