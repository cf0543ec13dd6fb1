use confhub_derive::confhub_error;
use std::borrow::Cow;

#[confhub_error]
pub enum DemoError {
    #[error("Read failed{}: {source}", format_context(.context))]
    Read {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unknown entry{}: {id}", format_context(.context))]
    Unknown { id: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = DemoError::Unknown { id: "a".into(), context: None };
    assert_eq!(err.kind(), "Unknown");
}
