//! Text pipeline integration tests
//!
//! Drives the chunker and transcript processor through whole recognition
//! sessions, the way the daemon feeds them

use babel_gateway::text::{ChunkBuffer, TranscriptProcessor, WORD_CHUNK_SIZE, random_tail};

#[test]
fn test_streaming_session_flow() {
    let mut processor = TranscriptProcessor::new(2, 2);
    let mut chunker = ChunkBuffer::new();

    // A partial hypothesis stream the way vosk-server produces it,
    // including repeated frames during pauses
    let hypotheses = [
        "ich",
        "ich gehe",
        "ich gehe",
        "ich gehe jetzt",
        "ich gehe jetzt nach",
        "ich gehe jetzt nach hause",
        "ich gehe jetzt nach hause heute",
    ];

    let mut chunks = Vec::new();
    for hypothesis in hypotheses {
        processor.handle_partial(hypothesis);
        if let Some(chunk) = chunker.offer_hypothesis(hypothesis) {
            chunks.push(chunk);
        }
    }

    assert_eq!(chunks, vec!["ich gehe jetzt", "nach hause heute"]);
    assert_eq!(processor.last_printed(), "hause heute");
    assert!(chunker.is_empty());
}

#[test]
fn test_chunk_cadence_matches_word_count() {
    let mut chunker = ChunkBuffer::new();
    let words = ["der", "hund", "läuft", "sehr", "schnell", "weg"];

    let mut hypothesis = String::new();
    let mut flushes = 0;
    for word in words {
        if !hypothesis.is_empty() {
            hypothesis.push(' ');
        }
        hypothesis.push_str(word);
        if chunker.offer_hypothesis(&hypothesis).is_some() {
            flushes += 1;
        }
    }

    assert_eq!(flushes, words.len() / WORD_CHUNK_SIZE);
}

#[test]
fn test_final_after_partial_not_reprinted() {
    let mut processor = TranscriptProcessor::new(5, 5);

    // Short utterance, so the window covers the whole text
    assert!(processor.handle_partial("hallo schöne welt").is_some());
    assert_eq!(processor.handle_final("hallo schöne welt"), None);
    assert_eq!(processor.last_printed(), "hallo schöne welt");
}

#[test]
fn test_new_session_reprints_same_utterance() {
    let mut processor = TranscriptProcessor::new(5, 5);
    let mut chunker = ChunkBuffer::new();

    assert!(processor.handle_final("guten morgen").is_some());
    chunker.offer_hypothesis("guten morgen");

    // Session restart clears duplicate tracking
    processor.reset();
    chunker.clear();

    assert!(processor.handle_final("guten morgen").is_some());
    assert_eq!(chunker.len(), 0);
    chunker.offer_hypothesis("guten morgen");
    assert_eq!(chunker.len(), 1);
}

#[test]
fn test_unclipped_final_shows_full_utterance() {
    let mut processor = TranscriptProcessor::new(2, 2);
    processor.set_clip_enabled(false);

    let utterance = "der schnelle braune fuchs springt über den faulen hund";
    assert!(processor.handle_partial(utterance).is_some());
    assert_eq!(processor.last_printed(), "faulen hund");

    assert_eq!(processor.handle_final(utterance), Some(utterance.to_string()));
    assert_eq!(processor.last_printed(), utterance);
}

#[test]
fn test_disabled_kinds_still_track_nothing() {
    let mut processor = TranscriptProcessor::new(2, 2);
    processor.set_partial_enabled(false);

    assert_eq!(processor.handle_partial("hallo welt"), None);
    assert_eq!(processor.last_printed(), "");

    // Finals are unaffected by the partial flag
    assert!(processor.handle_final("hallo welt").is_some());
}

#[test]
fn test_window_length_stays_in_range() {
    let text = "eins zwei drei vier fünf sechs sieben acht neun zehn";

    for _ in 0..50 {
        let tail = random_tail(text, 3, 7);
        let count = tail.split_whitespace().count();
        assert!((3..=7).contains(&count), "window had {count} words");
        assert!(text.ends_with(&tail));
    }
}

#[test]
fn test_window_keeps_trailing_clause() {
    for _ in 0..20 {
        let tail = random_tail("der Hund läuft schnell", 3, 4);
        let count = tail.split_whitespace().count();
        assert!((3..=4).contains(&count));
        assert!(tail.ends_with("schnell"));
    }
}

#[test]
fn test_exact_threshold_flushes_once() {
    let mut chunker = ChunkBuffer::new();

    assert_eq!(chunker.push("Hallo"), None);
    assert_eq!(chunker.push("Welt"), None);
    assert_eq!(chunker.push("Test"), Some("Hallo Welt Test".to_string()));
    assert!(chunker.is_empty());
}
