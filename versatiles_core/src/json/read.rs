#![allow(dead_code)]
use super::JsonValue;
use anyhow::{anyhow, Context, Error, Result};
use futures::{future::ready, stream, Stream, StreamExt};
use std::io::BufRead;

fn process_line(line: std::io::Result<String>, index: usize) -> Option<Result<JsonValue>> {
	match line {
		Ok(line) if line.trim().is_empty() => None, // Skip empty or whitespace-only lines
		Ok(line) => Some(JsonValue::parse_str(&line).with_context(|| format!("error in line {}", index + 1))),
		Err(e) => Some(Err(anyhow!("line {}: {}", index + 1, e))),
	}
}

pub fn read_ndjson_iter(reader: impl BufRead) -> impl Iterator<Item = Result<JsonValue>> {
	reader
		.lines()
		.enumerate()
		.filter_map(|(index, line)| process_line(line, index))
}

pub fn read_ndjson_stream(reader: impl BufRead) -> impl Stream<Item = Result<JsonValue>> {
	stream::iter(reader.lines().enumerate())
		.map(|(index, line)| tokio::spawn(async move { process_line(line, index) }))
		.buffered(num_cpus::get())
		.filter_map(|f| {
			ready(match f {
				Ok(value) => value,
				Err(e) => Some(Err(Error::from(e))),
			})
		})
}
