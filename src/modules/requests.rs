use indexmap::IndexMap;

use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeArity, NativeFunction, Value};

pub const MODULE_HELP: &str = "
A module for making HTTP requests. Responses carry the status code and the
raw response body.
";

pub fn exports() -> IndexMap<String, Value> {
    let mut exports = IndexMap::new();
    exports.insert(
        "get".to_string(),
        Value::Native(NativeFunction {
            name: "get",
            help: Some(
                "Fetches a URL, optionally with an Authorization header. \
                 Returns a dict with `status` and `response`.",
            ),
            arity: NativeArity::Range {
                min: 1,
                max: Some(2),
            },
            func: get,
        }),
    );
    exports
}

fn get(line: usize, runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let url = super::expect_string(&args[0], "requests.get", line)?;

    let agent = runtime.http_agent().clone();
    let mut request = agent.get(url);
    match args.get(1) {
        Some(Value::Null) | None => {}
        Some(value) => {
            let authorization = super::expect_string(value, "requests.get authorization", line)?;
            request = request.set("Authorization", authorization);
        }
    }

    let (status, body) = match request.call() {
        Ok(response) => {
            let status = response.status() as i64;
            let body = read_body(response, line)?;
            (status, body)
        }
        // Non-2xx responses still carry a useful status and body.
        Err(ureq::Error::Status(code, response)) => {
            let body = read_body(response, line)?;
            (code as i64, body)
        }
        Err(err) => {
            return Err(ScriptError::new(
                ErrorKind::Execution,
                line,
                format!("Request to '{}' failed: {}", url, err),
            ));
        }
    };

    let mut result = IndexMap::new();
    result.insert("status".to_string(), Value::Integer(status));
    result.insert("response".to_string(), Value::String(body));
    Ok(Value::Dict(result))
}

fn read_body(response: ureq::Response, line: usize) -> Result<String, ScriptError> {
    response.into_string().map_err(|err| {
        ScriptError::new(
            ErrorKind::Execution,
            line,
            format!("Failed reading the response body: {}", err),
        )
    })
}
