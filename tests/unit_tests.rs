use ventas_sync::config::{MysqlOpts, PostgresOpts, ServerOpts};

#[test]
fn test_mysql_opts_creation() {
    let opts = MysqlOpts {
        mysql_host: "mysql.internal".to_string(),
        mysql_user: "repl".to_string(),
        mysql_password: "secret".to_string(),
        mysql_db: "alianza".to_string(),
    };

    assert_eq!(opts.mysql_host, "mysql.internal");
    assert_eq!(opts.mysql_user, "repl");
    assert_eq!(opts.mysql_password, "secret");
    assert_eq!(opts.mysql_db, "alianza");
}

#[test]
fn test_postgres_opts_creation() {
    let opts = PostgresOpts {
        postgres_host: "pg.internal".to_string(),
        postgres_port: 5433,
        postgres_user: "loader".to_string(),
        postgres_password: "secret".to_string(),
        postgres_db: "eess".to_string(),
    };

    assert_eq!(opts.postgres_host, "pg.internal");
    assert_eq!(opts.postgres_port, 5433);
    assert_eq!(opts.postgres_user, "loader");
    assert_eq!(opts.postgres_password, "secret");
    assert_eq!(opts.postgres_db, "eess");
}

#[test]
fn test_server_opts_creation() {
    let opts = ServerOpts {
        bind_addr: "127.0.0.1:5000".to_string(),
    };

    assert_eq!(opts.bind_addr, "127.0.0.1:5000");
}
