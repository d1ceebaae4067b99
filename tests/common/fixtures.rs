//! Blueprint documents used across the integration tests.

/// Creates one group, named through the document context.
pub const GROUP_BLUEPRINT: &str = "\
version: 1
metadata:
  name: Default - Admin group
context:
  group_name: admins
entries:
  - model: idp_core.group
    identifiers:
      name: !Context group_name
    attrs:
      superuser: true
";

/// Creates a user that the identification stage can find.
pub const USER_BLUEPRINT: &str = "\
version: 1
metadata:
  name: Bootstrap users
entries:
  - model: idp_core.user
    identifiers:
      username: akadmin
    attrs:
      email: !Format ['admin@%s', !Context [domain, example.com]]
      name: Administrator
      attributes:
        upn: akadmin@corp.example.com
";

/// Opts out of automatic instantiation.
pub const MANUAL_BLUEPRINT: &str = "\
version: 1
metadata:
  name: Example - Manual only
  labels:
    blueprints.idp.dev/instantiate: \"false\"
entries:
  - model: idp_core.group
    identifiers:
      name: example
";

/// Declares a model nobody registered.
pub const UNKNOWN_MODEL_BLUEPRINT: &str = "\
version: 1
entries:
  - model: idp_core.widget
    identifiers:
      name: sprocket
";

/// A future format version.
pub const VERSION_TWO_BLUEPRINT: &str = "\
version: 2
entries: []
";

/// A blueprint without metadata.
pub const ANONYMOUS_BLUEPRINT: &str = "\
version: 1
entries:
  - model: idp_flows.flow
    identifiers:
      slug: default-authentication-flow
    attrs:
      designation: authentication
";
