//! `multipart/form-data` bodies for the upload endpoints.

use ulid::Ulid;

use crate::types::Attachment;

enum Part {
    Text { name: String, value: String },
    File { name: String, file: Attachment },
}

impl Part {
    fn content(&self) -> &[u8] {
        match self {
            Part::Text { value, .. } => value.as_bytes(),
            Part::File { file, .. } => &file.bytes,
        }
    }
}

fn fresh_boundary() -> String {
    format!("----fundlink-{}", Ulid::new())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: fresh_boundary(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self.ensure_boundary();
        self
    }

    pub fn file(mut self, name: &str, file: Attachment) -> Self {
        self.parts.push(Part::File {
            name: name.to_string(),
            file,
        });
        self.ensure_boundary();
        self
    }

    /// The boundary must not occur inside any part.
    fn ensure_boundary(&mut self) {
        while self
            .parts
            .iter()
            .any(|p| contains(p.content(), self.boundary.as_bytes()))
        {
            self.boundary = fresh_boundary();
        }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .map(|p| match p {
                Part::Text { name, .. } | Part::File { name, .. } => name.as_str(),
            })
            .collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape(name)
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File { name, file } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            escape(name),
                            escape(&file.file_name),
                            file.content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&file.bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_layout() {
        let form = Multipart::new().text("title", "Hello").file(
            "image",
            Attachment {
                file_name: "a \"b\".png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
        );
        let body = form.to_bytes();
        let text = String::from_utf8_lossy(&body);
        let boundary = form.content_type().split("boundary=").nth(1).unwrap().to_string();

        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("name=\"title\"\r\n\r\nHello\r\n"));
        assert!(text.contains("filename=\"a \\\"b\\\".png\""));
        assert!(text.contains("Content-Type: image/png"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
        assert_eq!(form.field_names(), vec!["title", "image"]);
    }

    #[test]
    fn boundary_is_replaced_when_content_contains_it() {
        let form = Multipart::new();
        let taken = form.boundary.clone();
        let mut bytes = b"%PDF-1.7 ".to_vec();
        bytes.extend_from_slice(taken.as_bytes());

        let form = form.file(
            "document",
            Attachment {
                file_name: "plan.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: bytes.clone(),
            },
        );
        assert_ne!(form.boundary, taken);
        assert!(!contains(&bytes, form.boundary.as_bytes()));
        assert!(form.content_type().ends_with(&form.boundary));
    }
}
