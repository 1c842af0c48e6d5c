use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_users_table(pool).await?;
    create_subject_tables(pool).await?;
    create_enrollments_table(pool).await?;
    create_facility_tables(pool).await?;
    create_booking_tables(pool).await?;
    create_reservations_table(pool).await?;
    create_library_tables(pool).await?;
    create_audit_log_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn execute_all(pool: &SqlitePool, statements: &[&str]) -> Result<()> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS users (
            handle TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('student', 'teacher', 'admin', 'library_admin')),
            password_hash TEXT NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#],
    )
    .await
}

async fn create_subject_tables(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY,
                teacher TEXT NOT NULL,
                name TEXT NOT NULL,
                UNIQUE (teacher, name),
                FOREIGN KEY (teacher) REFERENCES users (handle) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS subject_schedules (
                id INTEGER PRIMARY KEY,
                subject_id INTEGER NOT NULL,
                day TEXT NOT NULL CHECK (day IN ('Mon', 'Tue', 'Wed', 'Thu', 'Fri', 'Sat', 'Sun')),
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                FOREIGN KEY (subject_id) REFERENCES subjects (id) ON DELETE CASCADE
            )
            "#,
        ],
    )
    .await
}

async fn create_enrollments_table(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS enrollments (
                id INTEGER PRIMARY KEY,
                student TEXT NOT NULL,
                teacher TEXT NOT NULL,
                subject TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('Pending', 'Approved', 'Declined')),
                requested_at DATETIME NOT NULL,
                decided_at DATETIME
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_enrollments_teacher ON enrollments (teacher, status)",
            "CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments (student)",
        ],
    )
    .await
}

async fn create_facility_tables(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS labs (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                capacity INTEGER NOT NULL CHECK (capacity > 0)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS lab_pcs (
                lab_id INTEGER NOT NULL,
                number INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'available' CHECK (status IN ('available', 'out_of_service')),
                PRIMARY KEY (lab_id, number),
                FOREIGN KEY (lab_id) REFERENCES labs (id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                capacity INTEGER NOT NULL CHECK (capacity > 0)
            )
            "#,
        ],
    )
    .await
}

async fn create_booking_tables(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS booking_requests (
                id INTEGER PRIMARY KEY,
                student TEXT NOT NULL,
                teacher TEXT NOT NULL,
                subject TEXT NOT NULL,
                resource_kind TEXT NOT NULL CHECK (resource_kind IN ('lab', 'room')),
                lab_id INTEGER,
                room_id INTEGER,
                resource_name TEXT NOT NULL,
                pc_number INTEGER,
                start_time DATETIME NOT NULL,
                end_time DATETIME NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('Pending', 'Approved', 'Declined')),
                reason TEXT,
                requested_at DATETIME NOT NULL,
                decided_at DATETIME,
                decided_by TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                request_id INTEGER UNIQUE NOT NULL,
                student TEXT NOT NULL,
                teacher TEXT NOT NULL,
                subject TEXT NOT NULL,
                resource_kind TEXT NOT NULL CHECK (resource_kind IN ('lab', 'room')),
                lab_id INTEGER,
                room_id INTEGER,
                resource_name TEXT NOT NULL,
                pc_number INTEGER,
                start_time DATETIME NOT NULL,
                end_time DATETIME NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                ended_at DATETIME,
                FOREIGN KEY (request_id) REFERENCES booking_requests (id)
            )
            "#,
            // One active session per PC.
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_active_pc
            ON sessions (lab_id, pc_number)
            WHERE active = TRUE AND pc_number IS NOT NULL
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS pc_history (
                id INTEGER PRIMARY KEY,
                lab_id INTEGER NOT NULL,
                lab_name TEXT NOT NULL,
                pc_number INTEGER NOT NULL,
                student TEXT NOT NULL,
                student_name TEXT NOT NULL,
                teacher TEXT NOT NULL,
                subject TEXT NOT NULL,
                start_time DATETIME NOT NULL,
                end_time DATETIME NOT NULL,
                recorded_at DATETIME NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_pc_history_key ON pc_history (lab_name, pc_number)",
        ],
    )
    .await
}

async fn create_reservations_table(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id INTEGER PRIMARY KEY,
            teacher TEXT NOT NULL,
            subject TEXT NOT NULL,
            resource_kind TEXT NOT NULL CHECK (resource_kind IN ('lab', 'room')),
            resource_id INTEGER NOT NULL,
            resource_name TEXT NOT NULL,
            date DATE NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#],
    )
    .await
}

async fn create_library_tables(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS books (
                barcode TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Available' CHECK (status IN ('Available', 'Borrowed')),
                borrowed_by TEXT,
                borrowed_at DATETIME,
                due_date DATETIME
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS borrow_requests (
                id INTEGER PRIMARY KEY,
                student TEXT NOT NULL,
                barcode TEXT NOT NULL,
                book_title TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('Pending', 'Approved', 'Declined')),
                requested_at DATETIME NOT NULL,
                decided_at DATETIME,
                due_date DATETIME,
                feedback TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS borrow_records (
                id INTEGER PRIMARY KEY,
                barcode TEXT NOT NULL,
                book_title TEXT NOT NULL,
                borrower TEXT NOT NULL,
                borrower_name TEXT NOT NULL,
                borrowed_at DATETIME NOT NULL,
                due_date DATETIME NOT NULL,
                returned_at DATETIME
            )
            "#,
            // One outstanding loan per barcode.
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_borrow_records_open
            ON borrow_records (barcode)
            WHERE returned_at IS NULL
            "#,
        ],
    )
    .await
}

async fn create_audit_log_table(pool: &SqlitePool) -> Result<()> {
    execute_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY,
            ts DATETIME NOT NULL,
            action TEXT NOT NULL,
            actor TEXT NOT NULL,
            details TEXT NOT NULL DEFAULT '{}'
        )
        "#],
    )
    .await
}
