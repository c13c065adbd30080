//! Minimal HTTP/1.1 request parsing and response framing.

use crate::civil::DateTime;
use crate::pages::render_message;
use core::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

impl Method {
    fn parse(method: &str) -> Method {
        match method {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// Nothing but whitespace was received.
    Empty,
    /// The request line does not have a method, a target and a version.
    MalformedRequestLine,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Empty => f.write_str("empty request"),
            RequestError::MalformedRequestLine => f.write_str("malformed request line"),
        }
    }
}

/// A request borrowed from the receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub query: &'a str,
    headers: &'a str,
    pub body: &'a str,
}

impl<'a> Request<'a> {
    /// Returns the value of the first header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.split("\r\n").find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then_some(value.trim())
        })
    }
}

/// Parses the request line, headers and body out of `raw`.
pub fn parse_request(raw: &str) -> Result<Request<'_>, RequestError> {
    let raw = raw.trim_start();
    if raw.is_empty() {
        return Err(RequestError::Empty);
    }

    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let (request_line, headers) = head.split_once("\r\n").unwrap_or((head, ""));

    let mut parts = request_line.split_whitespace();
    let (method, target, _version) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v)) if v.starts_with("HTTP/") => (m, t, v),
        _ => return Err(RequestError::MalformedRequestLine),
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    Ok(Request {
        method: Method::parse(method),
        path,
        query,
        headers,
        body,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    SeeOther,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::SeeOther => 303,
            Status::Unauthorized => 401,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::SeeOther => "See Other",
            Status::Unauthorized => "Unauthorized",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

/// Writes the status line and headers, including the blank line ending them.
/// `extra_headers` are `(name, value)` pairs written after the fixed ones.
pub fn write_response_head<W: Write>(
    out: &mut W,
    status: Status,
    extra_headers: &[(&str, &str)],
) -> fmt::Result {
    write!(out, "HTTP/1.1 {} {}\r\n", status.code(), status.reason())?;
    out.write_str("Content-Type: text/html; charset=utf-8\r\nConnection: close\r\n")?;
    for (name, value) in extra_headers {
        write!(out, "{}: {}\r\n", name, value)?;
    }
    out.write_str("\r\n")
}

/// What the server should do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Info,
    Switch,
    MethodNotAllowed,
    NotFound,
}

pub fn route(method: Method, path: &str) -> Route {
    match (path, method) {
        ("/", _) => Route::Home,
        ("/info", _) => Route::Info,
        ("/switch", Method::Post) => Route::Switch,
        ("/switch", _) => Route::MethodNotAllowed,
        _ => Route::NotFound,
    }
}

/// Sent along with 401 responses.
pub const WWW_AUTHENTICATE: (&str, &str) = ("WWW-Authenticate", "Basic realm=\"garage\"");

/// A canned answer: status, extra headers and the message shown on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub headers: &'static [(&'static str, &'static str)],
    pub message: &'static str,
}

impl Reply {
    pub const UNAUTHORIZED: Reply = Reply {
        status: Status::Unauthorized,
        headers: &[WWW_AUTHENTICATE],
        message: "Authentication required",
    };
    pub const SWITCHED: Reply = Reply {
        status: Status::SeeOther,
        headers: &[("Location", "/")],
        message: "Door switched",
    };
    pub const SWITCH_FAILED: Reply = Reply {
        status: Status::InternalServerError,
        headers: &[],
        message: "Could not switch the door",
    };
    pub const METHOD_NOT_ALLOWED: Reply = Reply {
        status: Status::MethodNotAllowed,
        headers: &[("Allow", "POST")],
        message: "Method not allowed",
    };
    pub const NOT_FOUND: Reply = Reply {
        status: Status::NotFound,
        headers: &[],
        message: "Page not found",
    };
    pub const BAD_REQUEST: Reply = Reply {
        status: Status::InternalServerError,
        headers: &[],
        message: "Could not parse the request",
    };

    /// Writes the response head and a message page.
    pub fn write<W: Write>(&self, out: &mut W, date: Option<DateTime>) -> fmt::Result {
        write_response_head(out, self.status, self.headers)?;
        render_message(out, self.message, date)
    }
}

/// What the server does with a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Home,
    Info,
    PulseRelay,
    Reply(Reply),
}

/// Decides the answer to a request. `authorized` only matters for the switch.
pub fn decide(route: Route, authorized: bool) -> Action {
    match route {
        Route::Home => Action::Home,
        Route::Info => Action::Info,
        Route::Switch if authorized => Action::PulseRelay,
        Route::Switch => Action::Reply(Reply::UNAUTHORIZED),
        Route::MethodNotAllowed => Action::Reply(Reply::METHOD_NOT_ALLOWED),
        Route::NotFound => Action::Reply(Reply::NOT_FOUND),
    }
}

/// The answer once the relay has been pulsed, or failed to.
pub fn switch_reply(pulsed: bool) -> Reply {
    if pulsed {
        Reply::SWITCHED
    } else {
        Reply::SWITCH_FAILED
    }
}

/// Whether the request line and headers have been fully received.
pub fn head_complete(received: &[u8]) -> bool {
    received.windows(4).any(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{authorize, Credentials};

    const ADMIN: Credentials<'static> = Credentials {
        user: "admin",
        password: "s3cret",
    };

    fn written(reply: Reply) -> String {
        let mut out = String::new();
        reply.write(&mut out, None).unwrap();
        out
    }

    fn decide_for(raw: &str, credentials: Option<&Credentials<'_>>) -> Action {
        let request = parse_request(raw).unwrap();
        let authorized = authorize(credentials, request.header("Authorization"));
        decide(route(request.method, request.path), authorized)
    }

    const SWITCH_REQUEST: &str = "POST /switch HTTP/1.1\r\n\
        Host: 192.168.1.20\r\n\
        Content-Type: application/x-www-form-urlencoded\r\n\
        authorization: Basic YWRtaW46czNjcmV0\r\n\
        Content-Length: 0\r\n\
        \r\n";

    #[test]
    fn parses_form_post() {
        let request = parse_request(SWITCH_REQUEST).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/switch");
        assert_eq!(request.query, "");
        assert_eq!(request.body, "");
        assert_eq!(request.header("Host"), Some("192.168.1.20"));
        assert_eq!(request.header("Authorization"), Some("Basic YWRtaW46czNjcmV0"));
        assert_eq!(request.header("Cookie"), None);
    }

    #[test]
    fn splits_query_and_body() {
        let request = parse_request("GET /info?verbose=1 HTTP/1.0\r\n\r\nhello").unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/info");
        assert_eq!(request.query, "verbose=1");
        assert_eq!(request.body, "hello");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_request("  \r\n").unwrap_err(), RequestError::Empty);
        assert_eq!(
            parse_request("GET /\r\n\r\n").unwrap_err(),
            RequestError::MalformedRequestLine
        );
        assert_eq!(
            parse_request("hello there friend\r\n\r\n").unwrap_err(),
            RequestError::MalformedRequestLine
        );
    }

    #[test]
    fn routes() {
        assert_eq!(route(Method::Get, "/"), Route::Home);
        assert_eq!(route(Method::Get, "/info"), Route::Info);
        assert_eq!(route(Method::Post, "/switch"), Route::Switch);
        assert_eq!(route(Method::Get, "/switch"), Route::MethodNotAllowed);
        assert_eq!(route(Method::Get, "/favicon.ico"), Route::NotFound);
    }

    #[test]
    fn response_head() {
        let mut head = String::new();
        write_response_head(&mut head, Status::SeeOther, &[("Location", "/")]).unwrap();
        assert_eq!(
            head,
            "HTTP/1.1 303 See Other\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             Connection: close\r\n\
             Location: /\r\n\
             \r\n"
        );
    }

    #[test]
    fn authorized_switch_pulses_the_relay() {
        assert_eq!(decide_for(SWITCH_REQUEST, Some(&ADMIN)), Action::PulseRelay);
    }

    #[test]
    fn disabled_auth_lets_the_switch_through() {
        let anonymous = "POST /switch HTTP/1.1\r\nHost: garage\r\n\r\n";
        assert_eq!(decide_for(anonymous, None), Action::PulseRelay);
    }

    #[test]
    fn failed_auth_answers_401_with_a_challenge() {
        let wrong = SWITCH_REQUEST.replace("YWRtaW46czNjcmV0", "YWRtaW46d3Jvbmc=");
        let action = decide_for(&wrong, Some(&ADMIN));
        assert_eq!(action, Action::Reply(Reply::UNAUTHORIZED));

        let response = written(Reply::UNAUTHORIZED);
        assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
        assert!(response.contains("WWW-Authenticate: Basic realm=\"garage\"\r\n"));
        assert!(response.contains("<p>Authentication required</p>"));
    }

    #[test]
    fn switch_redirects_home_or_reports_failure() {
        let response = written(switch_reply(true));
        assert!(response.starts_with("HTTP/1.1 303 See Other\r\n"));
        assert!(response.contains("Location: /\r\n"));

        let response = written(switch_reply(false));
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.contains("<p>Could not switch the door</p>"));
    }

    #[test]
    fn get_on_switch_answers_405_with_allow() {
        let action = decide_for("GET /switch HTTP/1.1\r\n\r\n", Some(&ADMIN));
        assert_eq!(action, Action::Reply(Reply::METHOD_NOT_ALLOWED));

        let response = written(Reply::METHOD_NOT_ALLOWED);
        assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(response.contains("Allow: POST\r\n"));
    }

    #[test]
    fn pages_do_not_need_auth() {
        assert_eq!(decide(Route::Home, false), Action::Home);
        assert_eq!(decide(Route::Info, false), Action::Info);
        assert_eq!(
            decide(Route::NotFound, true),
            Action::Reply(Reply::NOT_FOUND)
        );
    }

    #[test]
    fn unparseable_request_answers_500() {
        assert!(parse_request("garbage\r\n\r\n").is_err());
        let response = written(Reply::BAD_REQUEST);
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.contains("<p>Could not parse the request</p>"));
    }

    #[test]
    fn head_is_complete_only_after_the_blank_line() {
        assert!(!head_complete(b"POST /switch HTTP/1.1\r\nHost: garage\r\n"));
        assert!(head_complete(SWITCH_REQUEST.as_bytes()));
        assert!(head_complete(b"GET / HTTP/1.1\r\n\r\nbody"));
    }
}
