//! Fine-tuning metadata from a checkpoint directory laid out like a BERT run

use descifrar::checkpoint::bundle::BundleWriter;
use descifrar::checkpoint::events::{Event, Value};
use descifrar::checkpoint::{load_finetune_metadata, read_events, CheckpointReader, RecordWriter};
use descifrar::Error;
use prost::Message;
use std::path::Path;
use tempfile::TempDir;

fn write_event_file(path: &Path, events: &[Event]) {
    std::fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir should succeed");
    let mut writer = RecordWriter::create(path).expect("create should succeed");
    for event in events {
        writer.write_record(&event.encode_to_vec()).expect("write should succeed");
    }
    writer.finish().expect("flush should succeed");
}

/// Span-prediction runs log their loss under `loss` rather than `loss_1`.
fn squad_style_run(dir: &Path) {
    let mut writer = BundleWriter::new();
    writer
        .add_i64_scalar("global_step", 500)
        .add_f32_tensor("output_bias", &[2], &[0.1, -0.1])
        .add_f32_tensor("output_weights", &[2, 3], &[0.0; 6]);
    writer.write(dir.join("model.ckpt-500")).expect("checkpoint write should succeed");

    let train: Vec<Event> = [(1, 6.0, 0.5), (250, 3.0, 0.25), (500, 1.0, 0.25)]
        .into_iter()
        .map(|(step, loss, norm)| {
            Event::scalars(step, vec![Value::simple("loss", loss), Value::simple("grads/global_norm", norm)])
        })
        .collect();
    write_event_file(&dir.join("events.out.tfevents.1565000000.worker"), &train);
    // a second, later events file is ignored
    write_event_file(&dir.join("events.out.tfevents.1566000000.worker"), &[]);

    let eval = vec![Event::scalars(500, vec![Value::simple("eval_accuracy", 0.5), Value::simple("eval_loss", 1.5)])];
    write_event_file(&dir.join("eval").join("events.out.tfevents.1565000100.worker"), &eval);
}

#[test]
fn test_squad_style_run_with_step_fallback() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    squad_style_run(dir.path());

    let meta = load_finetune_metadata(dir.path(), Some(&[250, 500][..])).expect("metadata should load");
    assert_eq!(meta.global_steps, Some(500));
    assert_eq!(meta.output_dims, Some(2));
    assert_eq!(meta.first_train_loss, Some(6.0));
    assert_eq!(meta.first_train_loss_norm, Some(3.0));
    assert_eq!(meta.steps.keys().copied().collect::<Vec<_>>(), vec![250, 500]);

    let last = &meta.steps[&500];
    assert_eq!(last.total_global_norms, Some(1.0));
    assert_eq!(last.train_loss, Some(1.0));
    assert_eq!(last.train_loss_norm, Some(0.5));
    assert_eq!(last.eval_accuracy, Some(0.5));
    assert_eq!(last.eval_loss, Some(1.5));
    assert_eq!(meta.steps[&250].eval_loss, None);

    let json = serde_json::to_value(&meta).expect("metadata serializes");
    assert_eq!(json["global_steps"], 500);
}

#[test]
fn test_checkpoint_lookup_without_steps_fails() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    squad_style_run(dir.path());

    let err = load_finetune_metadata(dir.path(), None).unwrap_err();
    assert!(matches!(err, Error::CheckpointNotFound(_)));
}

#[test]
fn test_reader_and_event_access() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    squad_style_run(dir.path());

    let reader = CheckpointReader::open(dir.path().join("model.ckpt-500")).expect("checkpoint should open");
    assert_eq!(reader.shape("output_weights").expect("tensor exists"), vec![2, 3]);
    assert_eq!(
        reader.tensor_names().collect::<Vec<_>>(),
        vec!["global_step", "output_bias", "output_weights"]
    );

    let events = read_events(dir.path().join("events.out.tfevents.1565000000.worker")).expect("events should read");
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].values()[0].scalar(), Some(1.0));
}
