//! End-to-end tests for the form pipeline

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use form_storage::{MemoryStore, ObjectStore, StorageError, PDF_CONTENT_TYPE};
use forms::{FormPipeline, FormType, PipelineConfig, Stage};
use image::{ImageBuffer, ImageFormat, Rgb};
use pdf_core::{DrawOp, PageSize, PdfDocument};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        template_dir: dir.join("templates"),
        staging_dir: dir.join("staging"),
        ..PipelineConfig::default()
    }
}

/// Signature pad capture: dark strokes on white, varied per signer
fn signature(seed: u32) -> String {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(60 + seed, 20, |x, y| {
        if (x + y * seed) % 7 == 0 {
            Rgb([20, 20, 60])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

fn texts(doc: &PdfDocument, page: usize) -> Vec<String> {
    doc.page_ops(page)
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.clone()),
            DrawOp::Image { .. } => None,
        })
        .collect()
}

fn images(doc: &PdfDocument) -> Vec<(usize, f64, f64, f64, f64)> {
    (1..=doc.page_count())
        .flat_map(|page| {
            doc.page_ops(page).iter().filter_map(move |op| match op {
                DrawOp::Image {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => Some((page, *x, *y, *width, *height)),
                DrawOp::Text { .. } => None,
            })
        })
        .collect()
}

fn invoice_data() -> Value {
    let notes: Vec<&str> = [
        "Inspected", "pump", "jack", "and", "replaced", "worn", "stuffing", "box", "packing",
        "before", "restarting", "the", "unit.",
    ]
    .iter()
    .copied()
    .cycle()
    .take(500)
    .collect();

    json!({
        "workTicketID": "WT-1001",
        "date": "2026-03-14",
        "customerName": "Permian Basin Operating",
        "leaseName": "Hendrick Ranch",
        "wellNumber": "14-2H",
        "laborHours": 6.5,
        "mileage": 84,
        "workCompleted": true,
        "followUpRequired": "no",
        "consumables": [
            { "description": "Stuffing box packing", "quantity": 2, "unitPrice": 45.0, "amount": 90.0 },
            { "description": "Teflon tape", "quantity": 3, "unitPrice": 4.5, "amount": 13.5 },
            { "description": "Grease cartridge", "quantity": 1, "unitPrice": 12.0, "amount": 12.0 }
        ],
        "total": 115.5,
        "notes": notes.join(" "),
        "signature": signature(3),
    })
}

fn jsa_data(people: usize) -> Value {
    let personnel: Vec<Value> = (0..people)
        .map(|i| {
            json!({
                "name": format!("Crew Member {}", i + 1),
                "title": if i == 0 { "Lead Operator" } else { "Floorhand" },
                "signature": signature(i as u32 + 1),
            })
        })
        .collect();

    json!({
        "workTicketID": "JSA-77",
        "date": "2026-03-14",
        "jobDescription": "Rig-up workover unit",
        "hardHat": true,
        "safetyGlasses": true,
        "h2sMonitor": "yes",
        "personnel": personnel,
        "hazards": "Pinch points at the rod elevators. Keep clear of the swing radius.",
    })
}

/// Store that refuses every upload
struct OfflineStore;

impl ObjectStore for OfflineStore {
    fn scheme(&self) -> &str {
        "s3"
    }

    async fn put_object(
        &self,
        _bucket: &str,
        _key: &str,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> form_storage::Result<()> {
        Err(StorageError::PutObject("dispatch failure".to_string()))
    }
}

// ============================================================================
// Invoice
// ============================================================================

#[tokio::test]
async fn invoice_with_long_notes_paginates_and_uploads_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let pipeline = FormPipeline::new(config(dir.path()), store.clone());

    let submission = pipeline
        .submit(FormType::Invoice, &invoice_data())
        .await
        .unwrap();

    assert!(submission.report.pages >= 2);
    assert_eq!(submission.report.table_rows, 3);
    assert_eq!(submission.report.embedded_signatures, 1);
    assert_eq!(submission.report.skipped_signatures, 0);
    assert!(submission.report.template_fallback);

    let objects = store.objects();
    assert_eq!(objects.len(), 1);
    let object = &objects[0];
    assert_eq!(object.bucket, "forms");
    assert_eq!(object.content_type, PDF_CONTENT_TYPE);
    assert!(object.key.starts_with("invoice-WT-1001-"));
    assert!(object.key.ends_with(".pdf"));
    assert_eq!(submission.upload.uri, format!("memory://forms/{}", object.key));

    let uploaded = lopdf::Document::load_mem(&object.body).unwrap();
    assert_eq!(uploaded.get_pages().len(), submission.report.pages);

    // Staged copy is cleaned up after a successful upload
    assert_eq!(submission.upload.staged_path, None);
    assert!(std::fs::read_dir(dir.path().join("staging"))
        .unwrap()
        .next()
        .is_none());
}

#[tokio::test]
async fn invoice_continuation_page_starts_with_heading() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = FormPipeline::new(config(dir.path()), MemoryStore::new());

    let rendered = pipeline
        .render(FormType::Invoice, &invoice_data())
        .await
        .unwrap();

    let page1 = texts(&rendered.document, 1);
    assert!(page1.contains(&"WT-1001".to_string()));
    assert!(page1.contains(&"Stuffing box packing".to_string()));
    // Checkbox marks only for truthy values
    assert_eq!(page1.iter().filter(|t| *t == "X").count(), 1);

    assert_eq!(texts(&rendered.document, 2)[0], "Notes (Continued)");
    assert_eq!(rendered.ticket_id.as_deref(), Some("WT-1001"));
}

#[tokio::test]
async fn invoice_missing_fields_render_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = FormPipeline::new(config(dir.path()), MemoryStore::new());

    let rendered = pipeline
        .render(FormType::Invoice, &json!({ "customerName": "Acme" }))
        .await
        .unwrap();

    let page1 = texts(&rendered.document, 1);
    assert!(page1.contains(&"Acme".to_string()));
    assert!(page1.contains(&"N/A".to_string()));
    assert!(page1.contains(&"0".to_string()));
    assert_eq!(rendered.document.page_count(), 1);
    assert_eq!(rendered.report.embedded_signatures, 0);
    assert_eq!(rendered.ticket_id, None);
}

#[tokio::test]
async fn missing_ticket_uses_unknown_in_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let pipeline = FormPipeline::new(config(dir.path()), store.clone());

    pipeline
        .submit(FormType::Invoice, &json!({}))
        .await
        .unwrap();

    assert!(store.objects()[0].key.starts_with("invoice-Unknown-"));
}

// ============================================================================
// JSA
// ============================================================================

#[tokio::test]
async fn jsa_signatures_follow_personnel_rows() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = FormPipeline::new(config(dir.path()), MemoryStore::new());

    let rendered = pipeline.render(FormType::Jsa, &jsa_data(4)).await.unwrap();
    assert_eq!(rendered.report.embedded_signatures, 4);
    assert_eq!(rendered.report.table_rows, 4);

    let placed = images(&rendered.document);
    assert_eq!(placed.len(), 4);

    for (i, (page, x, y, width, height)) in placed.iter().enumerate() {
        assert_eq!(*page, 1);
        assert_eq!(*x, 380.0);
        assert_eq!(*y, 560.0 - 26.0 * i as f64 - 6.0);
        assert!(*width <= 150.0 && *height <= 22.0);
    }

    // Boxes never overlap vertically
    for pair in placed.windows(2) {
        let (_, _, upper_y, _, _) = pair[0];
        let (_, _, lower_y, _, lower_h) = pair[1];
        assert!(lower_y + lower_h <= upper_y);
    }

    // Distinct signatures are embedded as distinct images
    let uploaded = lopdf::Document::load_mem(&rendered.document.to_bytes().unwrap()).unwrap();
    let image_count = uploaded
        .objects
        .values()
        .filter(|obj| {
            obj.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|t| t.as_name().ok())
                == Some(b"Image".as_slice())
        })
        .filter(|obj| {
            obj.as_stream()
                .map(|s| s.dict.get(b"SMask").is_ok())
                .unwrap_or(false)
        })
        .count();
    assert_eq!(image_count, 4);
}

#[tokio::test]
async fn jsa_corrupt_signature_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let pipeline = FormPipeline::new(config(dir.path()), store.clone());

    let mut data = jsa_data(3);
    data["personnel"][1]["signature"] = json!("data:image/png;base64,bm90IGEgcG5n");

    let submission = pipeline.submit(FormType::Jsa, &data).await.unwrap();
    assert_eq!(submission.report.embedded_signatures, 2);
    assert_eq!(submission.report.skipped_signatures, 1);
    assert_eq!(store.len(), 1);
    assert!(store.objects()[0].key.starts_with("jsa-JSA-77-"));
}

#[tokio::test]
async fn jsa_personnel_overflow_paginates_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        table_overflow: Some(forms::OverflowMode::Paginate),
        ..config(dir.path())
    };
    let pipeline = FormPipeline::new(config, MemoryStore::new());

    let rendered = pipeline.render(FormType::Jsa, &jsa_data(12)).await.unwrap();
    assert_eq!(rendered.report.table_rows, 12);
    assert_eq!(rendered.report.embedded_signatures, 12);
    assert!(rendered.document.page_count() >= 2);
    assert!(texts(&rendered.document, 2).contains(&"Personnel (Continued)".to_string()));
    assert!(images(&rendered.document).iter().any(|(page, ..)| *page == 2));
}

// ============================================================================
// Templates and failures
// ============================================================================

#[tokio::test]
async fn template_on_disk_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    PdfDocument::blank(PageSize {
        width: 612.0,
        height: 792.0,
    })
    .save(templates.join("invoice.pdf"))
    .unwrap();

    let pipeline = FormPipeline::new(config(dir.path()), MemoryStore::new());
    let rendered = pipeline
        .render(FormType::Invoice, &json!({ "workTicketID": "WT-5" }))
        .await
        .unwrap();

    assert!(!rendered.report.template_fallback);
    assert_eq!(rendered.document.page_size(1).unwrap().width, 612.0);
}

#[tokio::test]
async fn corrupt_template_falls_back_to_blank_page() {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("jsa.pdf"), b"not a pdf").unwrap();

    let pipeline = FormPipeline::new(config(dir.path()), MemoryStore::new());
    let rendered = pipeline.render(FormType::Jsa, &jsa_data(1)).await.unwrap();

    assert!(rendered.report.template_fallback);
    assert_eq!(rendered.document.page_size(1).unwrap(), PageSize::A4);
}

#[tokio::test]
async fn upload_failure_is_reported_with_stage() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        keep_staged: false,
        ..config(dir.path())
    };
    let pipeline = FormPipeline::new(config, OfflineStore);

    let err = pipeline
        .submit(FormType::Invoice, &invoice_data())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Upload);
    assert!(matches!(
        err.source,
        forms::FormError::StorageError(StorageError::PutObject(_))
    ));
    // The staged document survives for a later retry
    let staged: Vec<_> = std::fs::read_dir(dir.path().join("staging"))
        .unwrap()
        .collect();
    assert_eq!(staged.len(), 1);
}
