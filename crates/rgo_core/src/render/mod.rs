mod kitex;

pub use kitex::*;

use serde::Serialize;

use crate::idl::ThriftFile;
use crate::{Error, Result};

/// File name of the rendered client artifact inside a service module.
pub const CLIENT_FILE: &str = "rgo_cli.go";

const EDIT_CLIENT_TEMPLATE: &str = include_str!("templates/edit_client.go.tera");
const BUILD_CLIENT_TEMPLATE: &str = include_str!("templates/build_client.go.tera");

/// Which of the two client renderings to produce.
///
/// Both expose the same method set, so code written against one compiles
/// unchanged against the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The stub the IDE type-checks against: empty bodies, no dependency on
    /// the generated Kitex client.
    Edit,
    /// The real client, delegating to the Kitex-generated service package.
    Build,
}

/// Inputs of a client rendering.
#[derive(Debug)]
pub struct ClientRender<'a> {
    pub phase: Phase,
    pub idl: &'a ThriftFile,
    /// Wire-level service name, used by the build-phase `init()`.
    pub service_name: &'a str,
    /// Package/module segment of the service.
    pub format_service_name: &'a str,
    pub project_module: &'a str,
}

#[derive(Serialize)]
struct ClientContext {
    service: String,
    service_name: String,
    format_service_name: String,
    project_module: String,
    /// The go namespace as an import path segment, e.g. `example/user`.
    namespace_path: String,
    /// The package identifier of the namespace package, e.g. `user`.
    namespace_ident: String,
    /// The Kitex-generated service subpackage, e.g. `userservice`.
    service_pkg: String,
    functions: Vec<FunctionContext>,
}

#[derive(Serialize)]
struct FunctionContext {
    name: String,
    args: Vec<ArgContext>,
    ret: String,
}

#[derive(Serialize)]
struct ArgContext {
    name: String,
    ty: String,
}

/// Render the `rgo_cli.go` source for one service.
pub fn render_client(render: &ClientRender<'_>) -> Result<String> {
    let idl = render.idl;
    let namespace = idl.go_namespace().ok_or_else(|| Error::NoGoNamespace {
        path: idl.path.clone(),
    })?;
    let service = idl.primary_service().ok_or_else(|| Error::IdlParse {
        path: idl.path.clone(),
        message: "no service declaration".to_string(),
    })?;

    let namespace_path = namespace.replace('.', "/");
    let namespace_ident = namespace
        .rsplit('.')
        .next()
        .expect("rsplit yields at least one segment")
        .to_string();

    let functions = service
        .functions
        .iter()
        // oneway and void functions have no response type to stub out
        .filter(|f| !f.oneway && f.return_type != "void")
        .map(|f| FunctionContext {
            name: export_name(&f.name),
            args: f
                .arguments
                .iter()
                .map(|a| ArgContext {
                    name: a.name.clone(),
                    ty: bare_type(&a.ty).to_string(),
                })
                .collect(),
            ret: bare_type(&f.return_type).to_string(),
        })
        .collect();

    let context = ClientContext {
        service: service.name.clone(),
        service_name: render.service_name.to_string(),
        format_service_name: render.format_service_name.to_string(),
        project_module: render.project_module.to_string(),
        namespace_path,
        namespace_ident,
        service_pkg: service.name.to_lowercase(),
        functions,
    };

    let template = match render.phase {
        Phase::Edit => EDIT_CLIENT_TEMPLATE,
        Phase::Build => BUILD_CLIENT_TEMPLATE,
    };

    let mut tera = tera::Tera::default();
    tera.add_raw_template("client", template)?;
    let rendered = tera.render("client", &tera::Context::from_serialize(&context)?)?;
    Ok(rendered)
}

/// Title-case a function name the way Go exports it.
fn export_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Strip a qualifying prefix like `common.` from a type reference; the
/// rendered code addresses every type through the namespace package.
fn bare_type(ty: &str) -> &str {
    ty.rsplit('.').next().expect("rsplit yields at least one segment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl;
    use camino::Utf8Path;
    use expect_test::expect;

    const IDL: &str = r#"
namespace go example.user

struct QueryUserRequest { 1: string query }
struct QueryUserResponse { 1: string result }

service UserService {
    QueryUserResponse queryUser(1: QueryUserRequest req)
}
"#;

    fn render(phase: Phase) -> String {
        let idl = idl::parse(IDL, Utf8Path::new("user.thrift")).unwrap();
        render_client(&ClientRender {
            phase,
            idl: &idl,
            service_name: "svc.one",
            format_service_name: "svc_one",
            project_module: "rgo",
        })
        .unwrap()
    }

    #[test]
    fn edit_phase_renders_stub() {
        expect![[r#"
            package svc_one

            import (
            	"context"

            	"github.com/cloudwego/kitex/client"
            	"github.com/cloudwego/kitex/client/callopt"

            	"rgo/svc_one/kitex_gen/example/user"
            )

            type UserServiceClient struct{}

            func NewUserServiceClient(serviceName string, opts ...client.Option) (UserServiceClient, error) {
            	return UserServiceClient{}, nil
            }

            func (c *UserServiceClient) QueryUser(ctx context.Context, req *user.QueryUserRequest, opts ...callopt.Option) (*user.QueryUserResponse, error) {
            	return nil, nil
            }

            func QueryUser(ctx context.Context, req *user.QueryUserRequest, opts ...callopt.Option) (*user.QueryUserResponse, error) {
            	return nil, nil
            }
        "#]]
        .assert_eq(&render(Phase::Edit));
    }

    #[test]
    fn build_phase_renders_delegating_client() {
        expect![[r#"
            package svc_one

            import (
            	"context"

            	"github.com/cloudwego/kitex/client"
            	"github.com/cloudwego/kitex/client/callopt"

            	"rgo/svc_one/kitex_gen/example/user"
            	"rgo/svc_one/kitex_gen/example/user/userservice"
            )

            var defaultClient *UserServiceClient

            func init() {
            	defaultClient = &UserServiceClient{}
            	defaultClient.Client, _ = NewUserServiceClient("svc.one")
            }

            type UserServiceClient struct {
            	userservice.Client
            }

            func NewUserServiceClient(serviceName string, opts ...client.Option) (userservice.Client, error) {
            	serviceClient, err := userservice.NewClient(serviceName, opts...)
            	if err != nil {
            		return nil, err
            	}
            	return serviceClient, nil
            }

            func (c *UserServiceClient) QueryUser(ctx context.Context, req *user.QueryUserRequest, opts ...callopt.Option) (*user.QueryUserResponse, error) {
            	res, err := c.Client.QueryUser(ctx, req, opts...)
            	if err != nil {
            		return nil, err
            	}
            	return res, nil
            }

            func QueryUser(ctx context.Context, req *user.QueryUserRequest, opts ...callopt.Option) (*user.QueryUserResponse, error) {
            	res, err := defaultClient.QueryUser(ctx, req, opts...)
            	if err != nil {
            		return nil, err
            	}
            	return res, nil
            }
        "#]]
        .assert_eq(&render(Phase::Build));
    }

    #[test]
    fn both_phases_expose_the_same_method_set() {
        let signatures = |source: &str| -> Vec<String> {
            source
                .lines()
                .filter(|l| l.starts_with("func ") && l.contains("callopt.Option"))
                .map(|l| l.trim_end_matches(" {").to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            signatures(&render(Phase::Edit)),
            signatures(&render(Phase::Build))
        );
    }

    #[test]
    fn missing_go_namespace_fails() {
        let idl = idl::parse("namespace java j\nservice S { }", Utf8Path::new("s.thrift")).unwrap();
        let err = render_client(&ClientRender {
            phase: Phase::Edit,
            idl: &idl,
            service_name: "s",
            format_service_name: "s",
            project_module: "rgo",
        })
        .unwrap_err();
        assert!(matches!(err, Error::NoGoNamespace { .. }));
    }
}
