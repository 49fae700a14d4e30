use litellm_api::sse::{EventLineParser, StreamFrame};

#[test]
fn sse_chunk_boundaries_inside_a_line_are_reassembled() {
    let mut parser = EventLineParser::default();
    let mut frames = Vec::new();

    frames.extend(parser.feed(b"data: {\"choices\":[{\"delta\":"));
    assert!(frames.is_empty());

    frames.extend(parser.feed(b"{\"content\":\"Hello\"}}]}\ndata: "));
    assert_eq!(frames, vec![StreamFrame::Delta("Hello".to_string())]);

    frames.extend(parser.feed(b"[DONE]\n"));
    assert_eq!(frames.last(), Some(&StreamFrame::Done));
    assert!(parser.is_buffer_empty());
}

#[test]
fn sse_empty_delta_content_is_not_emitted() {
    let mut parser = EventLineParser::default();
    let frames = parser.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n");

    assert!(frames.is_empty());
    assert_eq!(parser.skipped_lines(), 0);
}

#[test]
fn sse_payload_without_choices_is_not_counted_as_skipped() {
    let mut parser = EventLineParser::default();
    let frames = parser.feed(b"data: {\"choices\":[]}\n");

    assert!(frames.is_empty());
    assert_eq!(parser.skipped_lines(), 0);
}

#[test]
fn sse_malformed_payloads_are_skipped_with_a_visible_count() {
    let mut parser = EventLineParser::default();
    let frames = parser.feed(
        concat!(
            "data: not json at all\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n",
            "data: {\"broken\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n",
        )
        .as_bytes(),
    );

    assert_eq!(
        frames,
        vec![
            StreamFrame::Delta("A".to_string()),
            StreamFrame::Delta("B".to_string()),
        ]
    );
    assert_eq!(parser.skipped_lines(), 2);
}

#[test]
fn sse_non_data_lines_are_ignored_without_counting() {
    let mut parser = EventLineParser::default();
    let frames = parser.feed(
        concat!(
            ": keep-alive\n",
            "\n",
            "event: message\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
        )
        .as_bytes(),
    );

    assert_eq!(frames, vec![StreamFrame::Delta("ok".to_string())]);
    assert_eq!(parser.skipped_lines(), 0);
}

#[test]
fn sse_finish_flushes_an_unterminated_trailing_line() {
    let mut parser = EventLineParser::default();
    assert!(parser
        .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}")
        .is_empty());

    assert_eq!(
        parser.finish(),
        vec![StreamFrame::Delta("tail".to_string())]
    );
    assert!(parser.is_buffer_empty());
}

#[test]
fn sse_finish_recognizes_a_trailing_done_sentinel() {
    let mut parser = EventLineParser::default();
    assert!(parser.feed(b"data: [DONE]").is_empty());
    assert_eq!(parser.finish(), vec![StreamFrame::Done]);
}

#[test]
fn sse_multibyte_character_split_across_chunks_survives() {
    let line = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n".as_bytes();
    let split = line
        .iter()
        .position(|byte| *byte == 0xc3)
        .expect("two-byte character present")
        + 1;

    let mut parser = EventLineParser::default();
    let mut frames = Vec::new();
    frames.extend(parser.feed(&line[..split]));
    frames.extend(parser.feed(&line[split..]));

    assert_eq!(frames, vec![StreamFrame::Delta("héllo".to_string())]);
    assert_eq!(parser.skipped_lines(), 0);
}

#[test]
fn sse_carriage_returns_are_tolerated() {
    let mut parser = EventLineParser::default();
    let frames = parser.feed(
        b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\ndata: [DONE]\r\n",
    );

    assert_eq!(
        frames,
        vec![StreamFrame::Delta("ok".to_string()), StreamFrame::Done]
    );
    assert_eq!(parser.skipped_lines(), 0);
}

#[test]
fn sse_fragments_preserve_provider_order() {
    let mut parser = EventLineParser::default();
    let frames = parser.feed(
        concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"one \"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"two \"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"three\"}}]}\n",
        )
        .as_bytes(),
    );

    assert_eq!(
        frames,
        vec![
            StreamFrame::Delta("one ".to_string()),
            StreamFrame::Delta("two ".to_string()),
            StreamFrame::Delta("three".to_string()),
        ]
    );
}
