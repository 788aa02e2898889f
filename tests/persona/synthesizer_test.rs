//! End-to-end synthesis runs against a scripted provider.

use std::sync::Arc;
use std::time::Duration;

use redpersona::config::SynthesisConfig;
use redpersona::persona::chunk::TruncationStrategy;
use redpersona::persona::prompts::consolidation_header;
use redpersona::persona::retry::RetryPolicy;
use redpersona::persona::{PersonaSynthesizer, SynthesisError};
use redpersona::types::{Comment, Post};

use crate::mock_provider::{http_error, ScriptedProvider};

fn post(title: &str, text: &str) -> Post {
    Post {
        title: title.to_owned(),
        text: text.to_owned(),
        url: format!("https://www.reddit.com/r/test/comments/{title}/"),
    }
}

fn comment(text: &str) -> Comment {
    Comment {
        text: text.to_owned(),
        url: "https://www.reddit.com/r/test/comments/x/y/c/".to_owned(),
    }
}

fn synthesizer(provider: &Arc<ScriptedProvider>, settings: SynthesisConfig) -> PersonaSynthesizer {
    let retry = RetryPolicy::new(3, Duration::from_secs(15), Duration::from_secs(1));
    PersonaSynthesizer::new(provider.clone(), settings, retry)
}

#[tokio::test]
async fn empty_input_makes_no_provider_calls() {
    let provider = Arc::new(ScriptedProvider::always("unused"));
    let result = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&[], &[], "ghost")
        .await;

    match result {
        Err(SynthesisError::EmptyInput { username }) => assert_eq!(username, "ghost"),
        other => panic!("expected EmptyInput, got {other:?}"),
    }
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn all_blank_input_is_empty_input() {
    let provider = Arc::new(ScriptedProvider::always("unused"));
    let result = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&[post("link", "  ")], &[comment("")], "ghost")
        .await;

    assert!(matches!(result, Err(SynthesisError::EmptyInput { .. })));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn two_posts_make_two_chunk_calls_and_one_consolidation() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![
            Ok("partial one".to_owned()),
            Ok("partial two".to_owned()),
            Ok("FINAL PERSONA".to_owned()),
        ],
        "unused",
    ));

    let persona = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&[post("a", "first"), post("b", "second")], &[], "alice")
        .await
        .expect("synthesis should succeed");

    assert_eq!(persona.text, "FINAL PERSONA");
    assert_eq!(persona.username, "alice");
    assert_eq!(persona.chunks_processed, 2);
    assert_eq!(persona.chunks_failed, 0);
    assert!(!persona.consolidation_failed);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("Text: first"));
    assert!(!prompts[0].contains("COMMENT"));
    assert!(prompts[1].contains("Text: second"));
    assert!(prompts[2].starts_with(&consolidation_header("alice")));
    assert!(prompts[2].ends_with("partial one\n\npartial two"));
}

#[tokio::test]
async fn post_and_comment_chunks_are_paired_by_index() {
    let provider = Arc::new(ScriptedProvider::always("insight"));
    let posts = [post("p1", "post one"), post("p2", "post two")];
    let comments = [comment("comment one"), comment("comment two"), comment("comment three")];

    let persona = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&posts, &comments, "bob")
        .await
        .expect("synthesis should succeed");

    assert_eq!(persona.chunks_processed, 3);
    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[0].contains("Text: post one") && prompts[0].contains("Text: comment one"));
    assert!(prompts[1].contains("Text: post two") && prompts[1].contains("Text: comment two"));
    assert!(!prompts[2].contains("POST 1:"));
    assert!(prompts[2].contains("Text: comment three"));
}

#[tokio::test]
async fn failed_chunk_placeholder_reaches_consolidation() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![
            Err(http_error(413, "Request too large")),
            Ok("second insight".to_owned()),
            Ok("final".to_owned()),
        ],
        "unused",
    ));

    let persona = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&[post("a", "one"), post("b", "two")], &[], "carol")
        .await
        .expect("chunk failures never abort the run");

    assert_eq!(persona.chunks_failed, 1);
    assert_eq!(persona.text, "final");
    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains(
        "Chunk failed due to prompt too large: provider returned 413: Request too large\n\nsecond insight"
    ));
}

#[tokio::test]
async fn consolidation_failure_becomes_final_text() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![
            Ok("only insight".to_owned()),
            Err(http_error(500, "upstream exploded")),
        ],
        "unused",
    ));

    let persona = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&[post("a", "one")], &[], "dave")
        .await
        .expect("consolidation failures never abort the run");

    assert!(persona.consolidation_failed);
    assert_eq!(
        persona.text,
        "Chunk failed: provider returned 500: upstream exploded"
    );
}

#[tokio::test]
async fn long_partials_are_cut_before_consolidation() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![Ok("a".repeat(10_000)), Ok("b".repeat(10_000))],
        "final",
    ));

    synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&[post("a", "one"), post("b", "two")], &[], "erin")
        .await
        .expect("synthesis should succeed");

    let prompts = provider.prompts();
    let partial_text = prompts[2]
        .strip_prefix(&consolidation_header("erin"))
        .expect("consolidation header comes first");
    assert_eq!(partial_text.chars().count(), 16_000);
}

#[tokio::test]
async fn chunk_size_groups_records() {
    let provider = Arc::new(ScriptedProvider::always("insight"));
    let settings = SynthesisConfig {
        chunk_size: 2,
        ..SynthesisConfig::default()
    };
    let posts = [post("a", "one"), post("b", "two"), post("c", "three")];

    let persona = synthesizer(&provider, settings)
        .synthesize(&posts, &[], "frank")
        .await
        .expect("synthesis should succeed");

    assert_eq!(persona.chunks_processed, 2);
    let prompts = provider.prompts();
    assert!(prompts[0].contains("POST 1:") && prompts[0].contains("POST 2:"));
    assert!(prompts[1].contains("Text: three"));
    assert!(!prompts[1].contains("POST 2:"));
}

#[tokio::test]
async fn budget_caps_each_category_independently() {
    let provider = Arc::new(ScriptedProvider::always("insight"));
    let posts: Vec<Post> = (0..15).map(|i| post(&format!("p{i}"), &format!("post {i}"))).collect();
    let comments: Vec<Comment> = (0..3).map(|i| comment(&format!("comment {i}"))).collect();

    let persona = synthesizer(&provider, SynthesisConfig::default())
        .synthesize(&posts, &comments, "gina")
        .await
        .expect("synthesis should succeed");

    assert_eq!(persona.chunks_processed, 10);
    assert_eq!(provider.calls(), 11);
    let prompts = provider.prompts();
    assert!(prompts[9].contains("Text: post 9"));
    assert!(!prompts.iter().any(|p| p.contains("Text: post 10")));
}

#[tokio::test]
async fn whole_record_truncation_is_configurable() {
    let provider = Arc::new(ScriptedProvider::always("insight"));
    let settings = SynthesisConfig {
        chunk_size: 2,
        max_prompt_chars: 2_000,
        truncation: TruncationStrategy::WholeRecords,
        ..SynthesisConfig::default()
    };
    let posts = [post("keep", "small"), post("drop", &"z".repeat(5_000))];

    synthesizer(&provider, settings)
        .synthesize(&posts, &[], "hank")
        .await
        .expect("synthesis should succeed");

    let prompts = provider.prompts();
    assert!(prompts[0].chars().count() <= 2_000);
    assert!(prompts[0].contains("Title: keep"));
    assert!(!prompts[0].contains("Title: drop"));
}
