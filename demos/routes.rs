use std::collections::HashMap;

use allow_route::{
    anyone, grant, revoke, rules, Authorizer, BoxError, Handler, Method, Namespace, Next,
    Options, Param, Registrar, Request, Result,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

type Endpoint = fn(&Request) -> String;

// toy router: routes keyed by method and full path.
#[derive(Default)]
struct Router {
    prefix: String,
    routes: HashMap<(Method, String), Vec<Handler<Endpoint>>>,
}

impl Registrar for Router {
    type Handler = Endpoint;

    fn register(&mut self, method: Method, path: &str, handlers: Vec<Handler<Endpoint>>) {
        self.routes
            .insert((method, format!("{}{}", self.prefix, path)), handlers);
    }
}

impl Namespace for Router {
    fn namespace<F>(&mut self, prefix: &str, routes: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let outer = self.prefix.clone();
        self.prefix.push_str(prefix);
        let result = routes(self);
        self.prefix = outer;
        result
    }
}

fn endpoint(f: Endpoint) -> Handler<Endpoint> {
    Handler::Route(f)
}

// prints whichever continuation the middleware picked.
struct Print<'a>(&'a str);

impl Next for Print<'_> {
    fn proceed(self) {
        println!("{}: proceed", self.0);
    }

    fn reject(self, status: u16) {
        println!("{}: rejected with {}", self.0, status);
    }

    fn fail(self, error: BoxError) {
        println!("{}: failed: {}", self.0, error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let auth = Authorizer::new(Options::from_json(r#"{ "lookin": "session" }"#)?)?;

    let is_admin = auth.where_(
        |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!("admin")) },
        vec!["role"],
    )?;
    let is_banned = auth.where_(
        |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!(true)) },
        vec![Param::key("banned")],
    )?;

    let public = auth.middleware(rules![anyone(), revoke(is_banned)]);
    let admin = auth.middleware(rules![grant(is_admin)]);

    let mut router = Router::default();
    let mut app = auth.wrap(&mut router);

    app.get("/", vec![public.clone().into(), endpoint(|_| String::from("home"))])?;
    app.namespace("/admin", |scope| {
        scope.get("/stats", vec![admin.clone().into(), endpoint(|_| String::from("stats"))])
    })?;

    if let Err(e) = app.post("/admin/reset", vec![endpoint(|_| String::from("reset"))]) {
        println!("startup check: {}", e);
    }

    let visitor = Request::new().with_value("session", "role", "guest");
    let banned = Request::new().with_value("session", "banned", true);
    let root = Request::new().with_value("session", "role", "admin");

    public.handle(&visitor, Print("GET / as guest")).await;
    public.handle(&banned, Print("GET / as banned")).await;
    admin.handle(&visitor, Print("GET /admin/stats as guest")).await;
    admin.handle(&root, Print("GET /admin/stats as admin")).await;

    Ok(())
}
