//! Framed-JSON TTS transport: requests are JSON terminated by the
//! literal `<EoM>` tag; replies are plain JSON. A `synth` reply is the
//! base64 RIFF bytes as a JSON string (empty on any failure), a
//! `listvoices` reply is the voice names in insertion order. Synthesis
//! failures never propagate to the client.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;

use karoo_core::Voice;

pub const END_OF_MESSAGE: &[u8] = b"<EoM>";

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    voicename: String,
    #[serde(default)]
    text: String,
}

pub struct TtsServer {
    /// Loaded voices, in load order.
    voices: Vec<Voice>,
}

impl TtsServer {
    pub fn new() -> Self {
        TtsServer { voices: Vec::new() }
    }

    pub fn add_voice(&mut self, voice: Voice) {
        log::info!("voice '{}' loaded", voice.name);
        self.voices.push(voice);
    }

    pub fn voice_names(&self) -> Vec<&str> {
        self.voices.iter().map(|v| v.name.as_str()).collect()
    }

    /// Synthesize to base64 RIFF bytes; any failure yields an empty
    /// payload.
    fn synth(&self, voicename: &str, text: &str) -> String {
        let voice = match self.voices.iter().find(|v| v.name == voicename) {
            Some(v) => v,
            None => {
                log::error!("unknown voice '{voicename}'");
                return String::new();
            }
        };
        let utt = match voice.synthesize(text, "text-to-wave") {
            Ok(utt) => utt,
            Err(e) => {
                log::error!("synthesis failed: {e}");
                return String::new();
            }
        };
        let bytes = match utt.waveform.as_ref().map(|w| w.riff_bytes()) {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                log::error!("waveform rendering failed: {e}");
                return String::new();
            }
            None => {
                log::error!("synthesis produced no waveform");
                return String::new();
            }
        };
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    /// Produce the JSON reply for one raw request.
    pub fn handle(&self, request: &[u8]) -> String {
        let request: Request = match serde_json::from_slice(request) {
            Ok(r) => r,
            Err(e) => {
                log::error!("bad request: {e}");
                return "\"\"".to_string();
            }
        };
        match request.kind.as_str() {
            "synth" => {
                log::info!("synthesis request for voice '{}'", request.voicename);
                serde_json::to_string(&self.synth(&request.voicename, &request.text))
                    .unwrap_or_else(|_| "\"\"".to_string())
            }
            "listvoices" => {
                log::info!("listvoices request");
                serde_json::to_string(&self.voice_names()).unwrap_or_else(|_| "[]".to_string())
            }
            other => {
                log::error!("unknown request type '{other}'");
                "\"\"".to_string()
            }
        }
    }

    /// Accept loop; one thread per connection.
    pub fn run(self, listener: TcpListener) -> Result<()> {
        let server = Arc::new(self);
        log::info!("waiting for connections on {}", listener.local_addr()?);
        for stream in listener.incoming() {
            let stream = stream.context("accept failed")?;
            let server = Arc::clone(&server);
            std::thread::spawn(move || {
                if let Err(e) = server.serve_connection(stream) {
                    log::error!("connection failed: {e}");
                }
            });
        }
        Ok(())
    }

    fn serve_connection(&self, mut stream: TcpStream) -> Result<()> {
        let request = read_request(&mut stream)?;
        let reply = self.handle(&request);
        stream.write_all(reply.as_bytes())?;
        stream.shutdown(std::net::Shutdown::Both).ok();
        Ok(())
    }
}

impl Default for TtsServer {
    fn default() -> Self {
        TtsServer::new()
    }
}

/// Read a request up to (and excluding) the end-of-message tag.
pub fn read_request(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).context("read failed")?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.ends_with(END_OF_MESSAGE) {
            buffer.truncate(buffer.len() - END_OF_MESSAGE.len());
            break;
        }
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use karoo_core::voices::{afrikaans_voice, english_voice, yoruba_voice};

    fn server() -> TtsServer {
        let mut server = TtsServer::new();
        server.add_voice(english_voice());
        server.add_voice(yoruba_voice());
        server.add_voice(afrikaans_voice());
        server
    }

    #[test]
    fn test_listvoices_insertion_order() {
        let reply = server().handle(br#"{"type": "listvoices", "voicename": "", "text": ""}"#);
        let names: Vec<String> = serde_json::from_str(&reply).unwrap();
        assert_eq!(names, vec!["english", "yoruba", "afrikaans"]);
    }

    #[test]
    fn test_synth_failure_is_empty_payload() {
        // The built-in english voice has no waveform backend.
        let reply =
            server().handle(br#"{"type": "synth", "voicename": "english", "text": "hello"}"#);
        assert_eq!(reply, "\"\"");
        let reply = server().handle(br#"{"type": "synth", "voicename": "nope", "text": "x"}"#);
        assert_eq!(reply, "\"\"");
    }

    #[test]
    fn test_bad_request_never_throws() {
        assert_eq!(server().handle(b"not json"), "\"\"");
        assert_eq!(server().handle(br#"{"type": "reboot"}"#), "\"\"");
    }

    #[test]
    fn test_framed_transport_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || server().run(listener).unwrap());

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(br#"{"type": "listvoices", "voicename": "", "text": ""}"#).unwrap();
        stream.write_all(END_OF_MESSAGE).unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        let names: Vec<String> = serde_json::from_str(&reply).unwrap();
        assert_eq!(names, vec!["english", "yoruba", "afrikaans"]);
    }
}
