diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    roles (id) {
        id -> Uuid,
        name -> Varchar,
        label -> Varchar,
    }
}

diesel::table! {
    role_user (role_id, user_id) {
        role_id -> Uuid,
        user_id -> Uuid,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        status -> Text,
        user_id -> Uuid,
        agent_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    responses (id) {
        id -> Uuid,
        content -> Text,
        ticket_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(role_user -> roles (role_id));
diesel::joinable!(role_user -> users (user_id));
diesel::joinable!(responses -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(users, roles, role_user, tickets, responses);
