// Shared definition of the `users` table.
//
// Every service reads the same database; `users` is the one cross-cutting
// table (live role checks, ban gates, profile enrichment), so its definition
// lives here instead of in a per-service schema.

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 100]
        name -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        #[max_length = 20]
        role -> Varchar,
        is_banned -> Bool,
        ban_reason -> Nullable<Text>,
        banned_at -> Nullable<Timestamptz>,
        banned_by -> Nullable<Uuid>,
        #[max_length = 100]
        location -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        skills_taught -> Array<Text>,
        skills_mastered -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
